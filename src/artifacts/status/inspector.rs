use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::file_change::{IndexChangeType, WorkspaceChangeType};
use derive_new::new;
use std::path::Path;

/// Compares the three trees: checked-out commit, index and working directory
#[derive(new)]
pub struct Inspector<'r> {
    repository: &'r Repository,
}

impl<'r> Inspector<'r> {
    /// Hash the working file and compare with the staged blob
    pub fn is_content_changed(&self, path: &Path, oid: &ObjectId) -> anyhow::Result<bool> {
        let data = self.repository.workspace().read_file(path)?;
        let blob = Blob::new(data);

        Ok(blob.object_id()? != *oid)
    }

    /// Cheap stat comparison first; content is only rehashed when size and
    /// mode agree but the timestamps do not.
    pub fn check_index_against_workspace(
        &self,
        entry: &IndexEntry,
        stat: Option<&EntryMetadata>,
    ) -> anyhow::Result<WorkspaceChangeType> {
        match stat {
            None => Ok(WorkspaceChangeType::Deleted),
            Some(stat) if !entry.stat_match(stat) => Ok(WorkspaceChangeType::Modified),
            Some(stat) if entry.times_match(stat) => Ok(WorkspaceChangeType::None),
            Some(_) if self.is_content_changed(&entry.name, &entry.oid)? => {
                Ok(WorkspaceChangeType::Modified)
            }
            Some(_) => Ok(WorkspaceChangeType::None),
        }
    }

    pub fn check_index_against_head_tree(
        &self,
        index_entry: Option<&IndexEntry>,
        head_entry: Option<&DatabaseEntry>,
    ) -> IndexChangeType {
        match (index_entry, head_entry) {
            (Some(index_entry), Some(head_entry))
                if head_entry.mode != index_entry.metadata.mode
                    || head_entry.oid != index_entry.oid =>
            {
                IndexChangeType::Modified
            }
            (Some(_), None) => IndexChangeType::Added,
            (None, Some(_)) => IndexChangeType::Deleted,
            _ => IndexChangeType::None,
        }
    }
}
