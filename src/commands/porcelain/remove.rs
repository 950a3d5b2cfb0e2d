use crate::areas::repository::Repository;
use std::io::Write;
use std::path::{Path, PathBuf};

impl Repository {
    /// Unstage files, or every file below a directory.
    ///
    /// Working files are only deleted when `delete` is set or the repository
    /// is configured with `remove.delete_working_files`.
    pub fn remove(&self, paths: &[PathBuf], delete: bool) -> anyhow::Result<()> {
        let delete = delete || self.config().remove.delete_working_files;
        self.remove_paths(paths, delete)
    }

    /// Unstage a single path, leaving the working tree alone
    pub fn unstage(&self, path: &Path) -> anyhow::Result<()> {
        self.remove_paths(&[path.to_path_buf()], false)
    }

    fn remove_paths(&self, paths: &[PathBuf], delete: bool) -> anyhow::Result<()> {
        self.ensure_initialized()?;
        self.ensure_attached()?;

        let mut index = self.index();
        index.rehydrate()?;

        let paths = paths
            .iter()
            .map(|path| self.workspace().relativize(path))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut unstaged = Vec::new();
        for path in &paths {
            let files = index.entries_under_path(path);
            index.remove(path)?;
            unstaged.extend(files);
        }

        index.write_updates()?;
        drop(index);

        for file in &unstaged {
            if delete {
                self.workspace().remove_file(file)?;
            }
            writeln!(self.writer(), "rm '{}'", file.display())?;
        }

        Ok(())
    }
}
