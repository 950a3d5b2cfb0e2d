//! Working directory access
//!
//! Paths handed to and returned from the workspace are relative to its root;
//! the repository metadata directory is never listed or touched.

use crate::areas::repository::REPOSITORY_DIR;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    pub fn new(path: PathBuf) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_ignored(name: &std::ffi::OsStr) -> bool {
        name == REPOSITORY_DIR
    }

    /// Immediate children of a directory with their metadata
    pub fn list_dir(&self, dir_path: &Path) -> anyhow::Result<BTreeMap<PathBuf, Metadata>> {
        let full_path = self.path.join(dir_path);
        let mut children = BTreeMap::new();

        let entries = std::fs::read_dir(&full_path)
            .with_context(|| format!("unable to list directory {}", full_path.display()))?;
        for entry in entries {
            let entry = entry?;
            if Self::is_ignored(&entry.file_name()) {
                continue;
            }

            let metadata = entry.metadata()?;
            children.insert(dir_path.join(entry.file_name()), metadata);
        }

        Ok(children)
    }

    /// Every file at or below `path`, sorted.
    ///
    /// Fails with `PathNotFound` if nothing exists at `path`.
    pub fn list_files(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let full_path = self.path.join(path);

        if !full_path.exists() {
            return Err(RepositoryError::PathNotFound(path.to_path_buf()).into());
        }
        if !full_path.is_dir() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&full_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.file_name()));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.path)
                .with_context(|| format!("{} escaped the workspace", entry.path().display()))?;
            files.push(relative.to_path_buf());
        }

        Ok(files)
    }

    /// Whether a directory holds at least one file, at any depth
    pub fn contains_files(&self, dir_path: &Path) -> bool {
        WalkDir::new(self.path.join(dir_path))
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.file_name()))
            .filter_map(Result::ok)
            .any(|entry| entry.file_type().is_file())
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.path.join(path).is_dir()
    }

    pub fn is_file(&self, path: &Path) -> bool {
        self.path.join(path).is_file()
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let full_path = self.path.join(file_path);

        std::fs::read(&full_path)
            .map(Bytes::from)
            .with_context(|| format!("unable to read file {}", full_path.display()))
    }

    /// Stat data of a regular file, `None` if nothing (or a directory) is there
    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<Option<EntryMetadata>> {
        let full_path = self.path.join(file_path);

        match std::fs::metadata(&full_path) {
            Ok(metadata) if metadata.is_file() => {
                Ok(Some((full_path.as_path(), metadata).try_into()?))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::NotADirectory => {
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("unable to stat {}", full_path.display())),
        }
    }

    /// Turn a user supplied path (absolute, or relative to the root) into a
    /// normalized root-relative path.
    ///
    /// Fails with `InvalidPath` for anything outside the workspace or inside
    /// the repository metadata directory. The root itself maps to an empty path.
    pub fn relativize(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let joined = self.path.join(path);
        let normalized = Self::normalize(&joined)
            .ok_or_else(|| RepositoryError::InvalidPath(path.to_path_buf()))?;

        let relative = match normalized.strip_prefix(&self.path) {
            Ok(relative) => relative.to_path_buf(),
            // the caller may have spelled the root through a symlink
            Err(_) => Self::canonicalize_existing(&normalized)
                .and_then(|canonical| {
                    canonical
                        .strip_prefix(&self.path)
                        .ok()
                        .map(Path::to_path_buf)
                })
                .ok_or_else(|| RepositoryError::InvalidPath(path.to_path_buf()))?,
        };

        if relative
            .components()
            .next()
            .is_some_and(|first| first.as_os_str() == REPOSITORY_DIR)
        {
            return Err(RepositoryError::InvalidPath(path.to_path_buf()).into());
        }

        Ok(relative)
    }

    /// Lexically resolve `.` and `..`; `None` if `..` climbs above the root
    fn normalize(path: &Path) -> Option<PathBuf> {
        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return None;
                    }
                }
                other => normalized.push(other),
            }
        }

        Some(normalized)
    }

    /// Canonicalize the longest existing ancestor and re-append the rest
    fn canonicalize_existing(path: &Path) -> Option<PathBuf> {
        let mut missing = Vec::new();
        let mut current = path;

        loop {
            if let Ok(canonical) = std::fs::canonicalize(current) {
                return Some(missing.iter().rev().fold(canonical, |acc, name| acc.join(name)));
            }
            missing.push(current.file_name()?);
            current = current.parent()?;
        }
    }

    /// Apply a planned checkout: deletions first, then writes
    pub fn apply_migration(&self, migration: &Migration) -> anyhow::Result<()> {
        for file_path in migration.deletions() {
            self.remove_file(file_path)?;
        }

        for (file_path, entry) in migration.writes() {
            let data = migration.load_blob_data(&entry.oid)?;
            self.write_file(file_path, &data, entry.mode.permissions())?;
        }

        Ok(())
    }

    /// Delete a file and any directories its removal leaves empty
    pub fn remove_file(&self, file_path: &Path) -> anyhow::Result<()> {
        let full_path = self.path.join(file_path);

        match std::fs::symlink_metadata(&full_path) {
            Ok(metadata) if metadata.is_dir() => {
                tracing::warn!(path = %file_path.display(), "not removing directory in place of a file");
                return Ok(());
            }
            Ok(_) => std::fs::remove_file(&full_path)
                .with_context(|| format!("failed to remove file {}", full_path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::NotADirectory => {}
            Err(e) => {
                return Err(e).with_context(|| format!("unable to stat {}", full_path.display()));
            }
        }

        self.prune_empty_parents(file_path)
    }

    fn prune_empty_parents(&self, file_path: &Path) -> anyhow::Result<()> {
        for parent in file_path
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            let full_path = self.path.join(parent);
            let is_empty = match std::fs::read_dir(&full_path) {
                Ok(mut entries) => entries.next().is_none(),
                Err(_) => false,
            };
            if !is_empty {
                break;
            }

            std::fs::remove_dir(&full_path)
                .with_context(|| format!("failed to remove directory {}", full_path.display()))?;
        }

        Ok(())
    }

    fn write_file(&self, file_path: &Path, data: &[u8], permissions: u32) -> anyhow::Result<()> {
        let full_path = self.path.join(file_path);

        // files standing where a parent directory must go are replaced
        let mut parents = file_path
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        parents.reverse();
        for parent in parents {
            let parent_path = self.path.join(parent);
            if let Ok(metadata) = std::fs::symlink_metadata(&parent_path)
                && !metadata.is_dir()
            {
                std::fs::remove_file(&parent_path).with_context(|| {
                    format!("failed to remove file {}", parent_path.display())
                })?;
            }
        }
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        if full_path.is_dir() {
            std::fs::remove_dir_all(&full_path).with_context(|| {
                format!("failed to remove existing directory {}", full_path.display())
            })?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&full_path)
            .with_context(|| format!("failed to open file {}", full_path.display()))?;
        file.write_all(data)
            .with_context(|| format!("failed to write to file {}", full_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&full_path, std::fs::Permissions::from_mode(permissions))
                .with_context(|| {
                    format!("failed to set permissions for file {}", full_path.display())
                })?;
        }

        Ok(())
    }
}
