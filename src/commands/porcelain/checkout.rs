use crate::areas::repository::Repository;
use crate::artifacts::checkout::migration::{FlatTree, Migration};
use crate::artifacts::config::CheckoutMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::revision::Revision;
use std::io::Write;

const DETACHMENT_NOTICE: &str = r#"
The working tree now reflects an older commit. HEAD has not moved, and new
commits can only be made on top of HEAD: run `checkout HEAD` to return to
it, or `reset` to make this commit the new HEAD.
"#;

impl Repository {
    /// Check out a commit into the index and working tree without moving HEAD
    pub fn checkout(&self, revision: &str) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let target_oid = Revision::try_parse(revision)?.resolve_commit(self)?;
        let target_commit = self.database().load_commit(&target_oid)?;
        let head_oid = self.refs().read_head()?;

        self.checkout_tree(target_commit.tree_oid(), self.config().checkout.mode)?;

        let detached = head_oid.as_ref() != Some(&target_oid);
        self.refs()
            .set_checkout(if detached { Some(&target_oid) } else { None })?;

        if detached {
            eprintln!("Note: checking out '{}'.\n{}", revision, DETACHMENT_NOTICE);
        }
        writeln!(
            self.writer(),
            "Working tree is now at {} {}",
            target_oid.to_short_oid(),
            target_commit.short_message()
        )?;

        Ok(())
    }

    /// Move the index and working tree from the tree of the current commit
    /// to the tree `tree_oid`
    pub fn checkout_tree(&self, tree_oid: &ObjectId, mode: CheckoutMode) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let target = self.database().flatten_tree(tree_oid)?;
        let current = match self.current_commit()? {
            Some(commit_oid) => {
                let commit = self.database().load_commit(&commit_oid)?;
                self.database().flatten_tree(commit.tree_oid())?
            }
            None => FlatTree::new(),
        };

        let mut index = self.index();
        index.rehydrate()?;

        let mut migration = Migration::new(self, &mut index, current, target);
        migration.apply_changes(mode)?;

        index.write_updates()?;
        tracing::debug!(tree = %tree_oid, %mode, "tree checked out");

        Ok(())
    }
}
