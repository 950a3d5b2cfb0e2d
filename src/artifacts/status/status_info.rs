use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::artifacts::status::file_change::{IndexChangeType, WorkspaceChangeType};
use crate::artifacts::status::inspector::Inspector;
use derive_new::new;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub type FileStatSet = BTreeMap<PathBuf, EntryMetadata>;
pub type HeadTree = BTreeMap<PathBuf, DatabaseEntry>;

/// Snapshot of how the working directory, index and checked-out commit differ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusInfo {
    pub index_changes: BTreeMap<PathBuf, IndexChangeType>,
    pub workspace_changes: BTreeMap<PathBuf, WorkspaceChangeType>,
    /// Untracked files, and untracked directories with a trailing separator
    pub untracked: BTreeSet<PathBuf>,
}

impl StatusInfo {
    /// Paths whose staged version differs from the checked-out commit
    pub fn staged(&self) -> impl Iterator<Item = &PathBuf> {
        self.index_changes.keys()
    }

    /// Staged paths whose working file differs from the index
    pub fn modified(&self) -> impl Iterator<Item = &PathBuf> {
        self.workspace_changes.keys()
    }

    pub fn untracked(&self) -> impl Iterator<Item = &PathBuf> {
        self.untracked.iter()
    }

    pub fn is_clean(&self) -> bool {
        self.index_changes.is_empty() && self.workspace_changes.is_empty() && self.untracked.is_empty()
    }

    /// Every changed path with its (index, workspace) change pair
    pub fn changes(&self) -> BTreeMap<&PathBuf, (IndexChangeType, WorkspaceChangeType)> {
        let mut changes = BTreeMap::new();

        for (path, change) in &self.index_changes {
            changes.entry(path).or_insert((IndexChangeType::None, WorkspaceChangeType::None)).0 = *change;
        }
        for (path, change) in &self.workspace_changes {
            changes.entry(path).or_insert((IndexChangeType::None, WorkspaceChangeType::None)).1 = *change;
        }

        changes
    }
}

#[derive(new)]
pub struct Status<'r> {
    repository: &'r Repository,
}

impl<'r> Status<'r> {
    /// Compute the status, refreshing the cached stat data of index entries
    /// found unchanged after rehashing. Callers flush the index afterwards.
    pub fn initialize(&self, index: &mut Index) -> anyhow::Result<StatusInfo> {
        let mut file_stats = FileStatSet::new();
        let mut untracked = BTreeSet::new();

        self.scan_workspace(Path::new(""), index, &mut untracked, &mut file_stats)?;
        let head_tree = self.load_head_tree()?;

        let inspector = Inspector::new(self.repository);
        let mut info = StatusInfo {
            untracked,
            ..Default::default()
        };

        let index_entries = index.entries().cloned().collect::<Vec<_>>();
        for entry in &index_entries {
            let stat = file_stats.get(&entry.name);
            match inspector.check_index_against_workspace(entry, stat)? {
                WorkspaceChangeType::None => {
                    if let Some(stat) = stat
                        && !entry.times_match(stat)
                    {
                        index.update_entry_stat(&entry.name, stat.clone());
                    }
                }
                change => {
                    info.workspace_changes.insert(entry.name.clone(), change);
                }
            }

            let change = inspector.check_index_against_head_tree(Some(entry), head_tree.get(&entry.name));
            if change != IndexChangeType::None {
                info.index_changes.insert(entry.name.clone(), change);
            }
        }

        for path in head_tree.keys() {
            if index.entry_by_path(path).is_none() {
                info.index_changes.insert(path.clone(), IndexChangeType::Deleted);
            }
        }

        Ok(info)
    }

    fn scan_workspace(
        &self,
        prefix_path: &Path,
        index: &Index,
        untracked: &mut BTreeSet<PathBuf>,
        file_stats: &mut FileStatSet,
    ) -> anyhow::Result<()> {
        let workspace = self.repository.workspace();

        for (path, metadata) in workspace.list_dir(prefix_path)? {
            if index.is_directly_tracked(&path) {
                if metadata.is_dir() {
                    self.scan_workspace(&path, index, untracked, file_stats)?;
                } else if let Some(stat) = workspace.stat_file(&path)? {
                    file_stats.insert(path, stat);
                }
            } else if metadata.is_dir() {
                // a directory without tracked files is listed once, if it holds any file
                if workspace.contains_files(&path) {
                    let mut path = path;
                    path.push("");
                    untracked.insert(path);
                }
            } else {
                untracked.insert(path);
            }
        }

        Ok(())
    }

    fn load_head_tree(&self) -> anyhow::Result<HeadTree> {
        match self.repository.current_commit()? {
            Some(commit_oid) => {
                let commit = self.repository.database().load_commit(&commit_oid)?;
                self.repository.database().flatten_tree(commit.tree_oid())
            }
            None => Ok(HeadTree::new()),
        }
    }
}
