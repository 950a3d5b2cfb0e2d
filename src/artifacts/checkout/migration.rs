//! Checkout migration
//!
//! Moves the working directory and index from the checked-out tree to a
//! target tree:
//!
//! 1. Every file of the target tree is (re)written
//! 2. Files tracked by the index or the checked-out tree but absent from the
//!    target are deleted, pruning directories left empty
//! 3. The index is replaced by the target tree
//!
//! Untracked files are never deleted. In safe mode, every path the checkout
//! would touch is inspected first and the whole checkout is refused with
//! `WorkingTreeConflict` if any of them carries local changes.

use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::checkout::conflict::{ConflictType, ConflictsSet};
use crate::artifacts::config::CheckoutMode;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::file_change::{IndexChangeType, WorkspaceChangeType};
use crate::artifacts::status::inspector::Inspector;
use crate::errors::RepositoryError;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Files of a flattened tree, keyed by path
pub type FlatTree = BTreeMap<PathBuf, DatabaseEntry>;

pub struct Migration<'r> {
    repository: &'r Repository,
    index: &'r mut Index,
    inspector: Inspector<'r>,
    /// Tree the working directory currently reflects
    current: FlatTree,
    target: FlatTree,
    deletions: BTreeSet<PathBuf>,
    conflicts: ConflictsSet,
}

impl<'r> Migration<'r> {
    pub fn new(repository: &'r Repository, index: &'r mut Index, current: FlatTree, target: FlatTree) -> Self {
        Self {
            repository,
            index,
            inspector: Inspector::new(repository),
            current,
            target,
            deletions: BTreeSet::new(),
            conflicts: ConflictsSet::new(),
        }
    }

    /// Files to write, with the blob and mode each one gets
    pub fn writes(&self) -> &FlatTree {
        &self.target
    }

    pub fn deletions(&self) -> &BTreeSet<PathBuf> {
        &self.deletions
    }

    pub fn apply_changes(&mut self, mode: CheckoutMode) -> anyhow::Result<()> {
        self.plan_changes(mode)?;
        self.repository.workspace().apply_migration(self)?;
        self.update_index()?;

        tracing::debug!(
            written = self.target.len(),
            deleted = self.deletions.len(),
            "checkout applied"
        );
        Ok(())
    }

    fn plan_changes(&mut self, mode: CheckoutMode) -> anyhow::Result<()> {
        for entry in self.target.values() {
            if !self.repository.database().exists(&entry.oid) {
                return Err(RepositoryError::ObjectNotFound(entry.oid.clone()).into());
            }
        }

        let tracked = self
            .index
            .entries()
            .map(|entry| entry.name.clone())
            .chain(self.current.keys().cloned())
            .collect::<BTreeSet<_>>();
        self.deletions = tracked
            .into_iter()
            .filter(|path| !self.target.contains_key(path))
            .collect();

        if mode == CheckoutMode::Safe {
            let touched = self
                .target
                .keys()
                .chain(self.deletions.iter())
                .cloned()
                .collect::<Vec<_>>();
            for path in &touched {
                self.check_for_conflict(path)?;
            }

            if !self.conflicts.is_empty() {
                return Err(RepositoryError::WorkingTreeConflict(std::mem::take(&mut self.conflicts)).into());
            }
        }

        Ok(())
    }

    fn check_for_conflict(&mut self, path: &Path) -> anyhow::Result<()> {
        let entry = self.index.entry_by_path(path);
        let old_entry = self.current.get(path);
        let new_entry = self.target.get(path);

        if self.index_differs_from_trees(entry, old_entry, new_entry) {
            self.conflicts.insert(path.to_path_buf(), ConflictType::StaleFile);
            return Ok(());
        }

        let workspace = self.repository.workspace();
        if workspace.is_dir(path) {
            if new_entry.is_some() && self.holds_untracked_files(path)? {
                self.conflicts.insert(path.to_path_buf(), ConflictType::StaleDirectory);
            }
            return Ok(());
        }

        let stat = workspace.stat_file(path)?;
        let conflict_type = ConflictType::get_conflict_type(stat.as_ref(), entry, new_entry);

        match (entry, stat.as_ref()) {
            (Some(entry), stat) => {
                let change = self.inspector.check_index_against_workspace(entry, stat)?;
                let lost = match change {
                    WorkspaceChangeType::None => false,
                    WorkspaceChangeType::Deleted => new_entry.is_some(),
                    WorkspaceChangeType::Modified => !self.matches_target(path, stat, new_entry)?,
                };
                if lost {
                    self.conflicts.insert(path.to_path_buf(), conflict_type);
                }
            }
            (None, Some(stat)) => {
                if !self.matches_target(path, Some(stat), new_entry)? {
                    self.conflicts.insert(path.to_path_buf(), conflict_type);
                }
            }
            (None, None) => {
                if new_entry.is_some()
                    && let Some(parent) = self.untracked_parent(path)
                {
                    self.conflicts.insert(parent, ConflictType::UntrackedOverwritten);
                }
            }
        }

        Ok(())
    }

    /// A staged change is lost only if the index matches neither side
    fn index_differs_from_trees(
        &self,
        index_entry: Option<&IndexEntry>,
        old_entry: Option<&DatabaseEntry>,
        new_entry: Option<&DatabaseEntry>,
    ) -> bool {
        self.inspector.check_index_against_head_tree(index_entry, old_entry) != IndexChangeType::None
            && self.inspector.check_index_against_head_tree(index_entry, new_entry)
                != IndexChangeType::None
    }

    /// Whether the working file already holds exactly what the target puts there
    fn matches_target(
        &self,
        path: &Path,
        stat: Option<&EntryMetadata>,
        new_entry: Option<&DatabaseEntry>,
    ) -> anyhow::Result<bool> {
        match (stat, new_entry) {
            (Some(stat), Some(new_entry)) if stat.mode == new_entry.mode => {
                Ok(!self.inspector.is_content_changed(path, &new_entry.oid)?)
            }
            _ => Ok(false),
        }
    }

    fn holds_untracked_files(&self, dir_path: &Path) -> anyhow::Result<bool> {
        Ok(self
            .repository
            .workspace()
            .list_files(dir_path)?
            .iter()
            .any(|file| self.index.entry_by_path(file).is_none()))
    }

    /// An untracked file standing where one of the parent directories goes
    fn untracked_parent(&self, path: &Path) -> Option<PathBuf> {
        path.ancestors()
            .skip(1)
            .filter(|parent| !parent.as_os_str().is_empty())
            .find(|parent| {
                self.repository.workspace().is_file(parent)
                    && self.index.entry_by_path(parent).is_none()
            })
            .map(Path::to_path_buf)
    }

    fn update_index(&mut self) -> anyhow::Result<()> {
        let mut entries = Vec::with_capacity(self.target.len());

        for (path, entry) in &self.target {
            let stat = self
                .repository
                .workspace()
                .stat_file(path)?
                .unwrap_or_else(|| EntryMetadata::from_mode(entry.mode));
            entries.push(IndexEntry::new(path.clone(), entry.oid.clone(), stat));
        }

        self.index.reset_to(entries);
        Ok(())
    }

    pub fn load_blob_data(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        Ok(self.repository.database().load_blob(object_id)?.into_content())
    }
}
