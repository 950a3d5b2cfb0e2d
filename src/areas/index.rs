//! Staging area
//!
//! The index tracks which file versions go into the next commit along with
//! their cached stat data.
//!
//! ## Data Structures
//!
//! - `entries`: maps file paths to their index entries
//! - `children`: maps directory paths to every entry below them, so a file and
//!   a directory of the same name never coexist
//!
//! The in-memory state is loaded with [`Index::rehydrate`] and persisted with
//! [`Index::write_updates`]; nothing touches the disk in between.

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_FIXED_SIZE, EntryMetadata, IndexEntry, entry_size};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::HEADER_SIZE;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::RepositoryError;
use anyhow::Context;
use byteorder::{ByteOrder, NetworkEndian};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Index {
    path: PathBuf,
    entries: BTreeMap<PathBuf, IndexEntry>,
    children: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    /// Set whenever the in-memory state diverges from the file
    changed: bool,
}

impl Index {
    pub fn new(path: PathBuf) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.changed = false;
    }

    /// Load the index from disk
    ///
    /// A missing or empty file is an empty index. Reading holds a shared lock
    /// on the file; a bad signature, malformed entry or checksum mismatch fails
    /// with `CorruptIndex`.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.path)
            .with_context(|| format!("failed to open index {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        if lock.deref_mut().metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        let entries_count = Self::parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;
        reader.verify()?;

        tracing::trace!(entries = self.entries.len(), "index loaded");
        Ok(())
    }

    fn parse_header(reader: &mut Checksum) -> anyhow::Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(header_bytes.as_ref())?;
        header.validate()?;

        Ok(header.entries_count)
    }

    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum) -> anyhow::Result<()> {
        for _ in 0..entries_count {
            let fixed = reader.read(ENTRY_FIXED_SIZE)?;
            let name_len = NetworkEndian::read_u16(&fixed[ENTRY_FIXED_SIZE - 2..]) as usize;
            let rest = reader.read(entry_size(name_len) - ENTRY_FIXED_SIZE)?;

            let entry_bytes = [fixed.as_ref(), rest.as_ref()].concat();
            let entry = IndexEntry::deserialize(entry_bytes.as_slice()).map_err(|e| {
                match e.downcast::<RepositoryError>() {
                    Ok(error) => error,
                    Err(e) => RepositoryError::CorruptIndex(format!("{e:#}")),
                }
            })?;

            if self.entries.contains_key(&entry.name) {
                return Err(RepositoryError::CorruptIndex(format!(
                    "duplicate entry {}",
                    entry.name.display()
                ))
                .into());
            }
            self.store_entry(entry);
        }

        Ok(())
    }

    /// Drop entries that would clash with `entry`: files standing where one of
    /// its parent directories should be, and anything below a directory with
    /// the same name as the entry itself.
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_path_buf())
                .or_default()
                .insert(entry.name.clone());
        }

        self.entries.insert(entry.name.clone(), entry);
    }

    fn remove_children(&mut self, path: &Path) -> bool {
        match self.children.remove(path) {
            Some(children) => {
                for child in children {
                    self.remove_entry(&child);
                }
                true
            }
            None => false,
        }
    }

    fn remove_entry(&mut self, path: &Path) -> bool {
        let Some(entry) = self.entries.remove(path) else {
            return false;
        };

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(path);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }

        true
    }

    /// Stage an entry, replacing whatever was staged at the same path and any
    /// entries it conflicts with
    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);
        self.changed = true;
    }

    /// Unstage a file, or every file below a directory; the empty path
    /// unstages everything.
    ///
    /// Fails with `PathNotStaged` when nothing is staged at or below `path`.
    pub fn remove(&mut self, path: &Path) -> anyhow::Result<()> {
        if path.as_os_str().is_empty() && !self.entries.is_empty() {
            self.entries.clear();
            self.children.clear();
            self.changed = true;
            return Ok(());
        }

        let removed_entry = self.remove_entry(path);
        let removed_children = self.remove_children(path);

        if !removed_entry && !removed_children {
            return Err(RepositoryError::PathNotStaged(path.to_path_buf()).into());
        }

        self.changed = true;
        Ok(())
    }

    /// Replace every entry, e.g. with the flattened tree of a checked out commit
    pub fn reset_to(&mut self, entries: impl IntoIterator<Item = IndexEntry>) {
        self.entries.clear();
        self.children.clear();

        for entry in entries {
            self.store_entry(entry);
        }
        self.changed = true;
    }

    /// Persist the index under an exclusive lock, if anything changed
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        if !self.changed {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("failed to open index {}", self.path.display()))?;
        let lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut writer = Checksum::new(lock);

        let header = IndexHeader {
            entries_count: u32::try_from(self.entries.len())?,
            ..IndexHeader::empty()
        };
        writer.write(&header.serialize()?)?;

        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;
        self.changed = false;

        tracing::debug!(entries = self.entries.len(), "index written");
        Ok(())
    }

    /// Refresh the cached stat data of an entry whose content is unchanged
    pub fn update_entry_stat(&mut self, path: &Path, stat: EntryMetadata) {
        if let Some(existing_entry) = self.entries.get_mut(path) {
            existing_entry.metadata = stat;
            self.changed = true;
        }
    }

    /// Entries ordered by path
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `path` is a staged file or a directory containing staged files
    pub fn is_directly_tracked(&self, path: &Path) -> bool {
        self.entries.contains_key(path) || self.children.contains_key(path)
    }

    /// Staged file paths equal to or below `path`; the empty path is the root
    pub fn entries_under_path(&self, path: &Path) -> Vec<PathBuf> {
        if path.as_os_str().is_empty() {
            return self.entries.keys().cloned().collect();
        }

        match self.children.get(path) {
            Some(children) => children.iter().cloned().collect(),
            None if self.entries.contains_key(path) => vec![path.to_path_buf()],
            None => Vec::new(),
        }
    }
}
