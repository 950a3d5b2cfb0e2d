use crate::areas::repository::Repository;
use crate::artifacts::config::CheckoutMode;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::revision::Revision;
use crate::artifacts::status::inspector::Inspector;
use crate::errors::RepositoryError;
use std::io::Write;

impl Repository {
    /// Move HEAD to a commit and force the index and working tree to match it
    pub fn reset(&self, revision: &str) -> anyhow::Result<ObjectId> {
        self.ensure_initialized()?;

        let commit_oid = Revision::try_parse(revision)?.resolve_commit(self)?;
        self.reset_to_commit(&commit_oid)?;

        Ok(commit_oid)
    }

    /// Commits after the target stay in the object database but are no
    /// longer reachable from HEAD.
    pub fn reset_to_commit(&self, commit_oid: &ObjectId) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let commit = self.load_commit_checked(commit_oid)?;

        self.checkout_tree(commit.tree_oid(), CheckoutMode::Force)?;
        self.refs().update_head(commit_oid)?;
        self.refs().set_checkout(None)?;

        writeln!(
            self.writer(),
            "HEAD is now at {} {}",
            commit_oid.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }

    /// Replace the index with the files of a stored tree, leaving the working
    /// tree alone
    pub fn reset_index(&self, tree_oid: &ObjectId) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let target = self.database().flatten_tree(tree_oid)?;
        let inspector = Inspector::new(self);

        let mut index = self.index();
        index.rehydrate()?;

        let mut entries = Vec::with_capacity(target.len());
        for (path, entry) in target {
            // cached stat data is only trusted for files already holding the blob
            let stat = match self.workspace().stat_file(&path)? {
                Some(stat) if stat.mode == entry.mode => {
                    if inspector.is_content_changed(&path, &entry.oid)? {
                        EntryMetadata::from_mode(entry.mode)
                    } else {
                        stat
                    }
                }
                _ => EntryMetadata::from_mode(entry.mode),
            };
            entries.push(IndexEntry::new(path, entry.oid, stat));
        }

        index.reset_to(entries);
        index.write_updates()
    }

    fn load_commit_checked(&self, commit_oid: &ObjectId) -> anyhow::Result<Commit> {
        match self.database().parse_object(commit_oid)? {
            ObjectBox::Commit(commit) => Ok(*commit),
            _ => Err(RepositoryError::NotACommit(commit_oid.clone()).into()),
        }
    }
}
