use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Paths a safe checkout refused to touch, with the reason for each
pub type ConflictsSet = BTreeMap<PathBuf, ConflictType>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConflictType {
    /// Staged or unstaged changes to a tracked file would be lost
    StaleFile,
    /// A directory holding untracked files stands where a file goes
    StaleDirectory,
    /// An untracked file would be overwritten
    UntrackedOverwritten,
    /// An untracked file would be deleted
    UntrackedRemoved,
}

impl ConflictType {
    pub fn get_conflict_type(
        stat: Option<&EntryMetadata>,
        entry: Option<&IndexEntry>,
        new_entry: Option<&DatabaseEntry>,
    ) -> ConflictType {
        if entry.is_some() {
            ConflictType::StaleFile
        } else if let Some(stat) = stat
            && stat.mode.is_tree()
        {
            ConflictType::StaleDirectory
        } else if new_entry.is_some() {
            ConflictType::UntrackedOverwritten
        } else {
            ConflictType::UntrackedRemoved
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            ConflictType::StaleFile => "local changes would be overwritten",
            ConflictType::StaleDirectory => "untracked files in directory would be lost",
            ConflictType::UntrackedOverwritten => "untracked file would be overwritten",
            ConflictType::UntrackedRemoved => "untracked file would be removed",
        };
        write!(f, "{}", message)
    }
}
