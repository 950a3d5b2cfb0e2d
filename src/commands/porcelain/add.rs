use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::blob::Blob;
use crate::errors::RepositoryError;
use bytes::Bytes;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

impl Repository {
    /// Stage files and directories from the working tree.
    ///
    /// Tracked files missing from the working tree have their deletion staged.
    pub fn add(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        self.ensure_initialized()?;
        self.ensure_attached()?;

        let mut index = self.index();
        index.rehydrate()?;

        // resolve every path before touching the index, so a bad one stages nothing
        let paths = paths
            .iter()
            .map(|path| self.workspace().relativize(path))
            .collect::<anyhow::Result<Vec<_>>>()?;

        for path in &paths {
            self.add_path(&mut index, path)?;
        }

        index.write_updates()?;

        Ok(())
    }

    fn add_path(&self, index: &mut Index, path: &Path) -> anyhow::Result<()> {
        let tracked = index.entries_under_path(path);

        if !self.workspace().path().join(path).exists() {
            if tracked.is_empty() {
                return Err(RepositoryError::PathNotFound(path.to_path_buf()).into());
            }
            return index.remove(path);
        }

        let files = self.workspace().list_files(path)?;
        for file in &files {
            let stat = self.workspace().stat_file(file)?;
            let data = self.workspace().read_file(file)?;
            self.stage_into(index, file, data, stat)?;
        }

        let files = files.into_iter().collect::<BTreeSet<_>>();
        for gone in tracked.iter().filter(|tracked| !files.contains(*tracked)) {
            // staging a file may already have displaced the entry
            if index.entry_by_path(gone).is_some() {
                tracing::debug!(path = %gone.display(), "staging deletion");
                index.remove(gone)?;
            }
        }

        Ok(())
    }

    /// Store `content` as a blob and stage it at `path`.
    ///
    /// No stat data is cached, so the next status rehashes the working file.
    pub fn stage(&self, path: &Path, content: Bytes) -> anyhow::Result<()> {
        self.ensure_initialized()?;
        self.ensure_attached()?;

        let path = self.workspace().relativize(path)?;
        if path.as_os_str().is_empty() {
            return Err(RepositoryError::InvalidPath(path).into());
        }

        let mut index = self.index();
        index.rehydrate()?;
        self.stage_into(&mut index, &path, content, None)?;
        index.write_updates()?;

        Ok(())
    }

    fn stage_into(
        &self,
        index: &mut Index,
        path: &Path,
        content: Bytes,
        stat: Option<EntryMetadata>,
    ) -> anyhow::Result<()> {
        let size = content.len() as u32;
        let blob_id = self.database().store(&Blob::new(content))?;

        let stat = stat.unwrap_or_else(|| {
            // keep the mode of an existing entry when there is no stat data
            let mode = index
                .entry_by_path(path)
                .map(|entry| entry.metadata.mode)
                .unwrap_or_default();
            EntryMetadata {
                size,
                ..EntryMetadata::from_mode(mode)
            }
        });
        index.add(IndexEntry::new(path.to_path_buf(), blob_id, stat));

        Ok(())
    }
}
