use crate::areas::repository::Repository;
use crate::artifacts::status::file_change::FileChangeType;
use crate::artifacts::status::status_info::StatusInfo;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

// Terminology:
// - staged: the index differs from the checked-out commit
// - modified: a staged file differs from its working copy (content, mode, or deleted)
// - untracked: files on disk the index does not know about
impl Repository {
    /// Compute the status, flushing the stat data refreshed along the way
    pub fn status_info(&self) -> anyhow::Result<StatusInfo> {
        self.ensure_initialized()?;

        let mut index = self.index();
        index.rehydrate()?;

        let info = self.status().initialize(&mut index)?;
        index.write_updates()?;

        Ok(info)
    }

    pub fn show_status(&self, porcelain: bool) -> anyhow::Result<()> {
        let info = self.status_info()?;

        if porcelain {
            self.print_porcelain_format(&info)
        } else {
            self.print_long_format(&info)
        }
    }

    fn print_porcelain_format(&self, info: &StatusInfo) -> anyhow::Result<()> {
        for (path, (index_change, workspace_change)) in info.changes() {
            writeln!(
                self.writer(),
                "{}{} {}",
                index_change.short_code(),
                workspace_change.short_code(),
                path.display()
            )?;
        }

        for path in info.untracked() {
            writeln!(self.writer(), "?? {}", path.display())?;
        }

        Ok(())
    }

    fn print_long_format(&self, info: &StatusInfo) -> anyhow::Result<()> {
        self.print_position()?;

        let staged = info
            .index_changes
            .iter()
            .map(|(path, change)| (path, FileChangeType::Index(*change)))
            .collect::<Vec<_>>();
        self.print_changes("Changes to be committed:", &staged)?;

        let unstaged = info
            .workspace_changes
            .iter()
            .map(|(path, change)| (path, FileChangeType::Workspace(*change)))
            .collect::<Vec<_>>();
        self.print_changes("Changes not staged for commit:", &unstaged)?;

        if !info.untracked.is_empty() {
            writeln!(self.writer(), "Untracked files:")?;
            for path in info.untracked() {
                writeln!(self.writer(), "{:>8}{}", "", path.display().to_string().red())?;
            }
            writeln!(self.writer())?;
        }

        self.print_commit_hint(info)
    }

    fn print_position(&self) -> anyhow::Result<()> {
        let head = self.refs().read_head()?;

        match (self.refs().read_checkout()?, head) {
            (Some(checkout), Some(head)) => writeln!(
                self.writer(),
                "Checked out {} (HEAD is at {})\n",
                checkout.to_short_oid(),
                head.to_short_oid()
            )?,
            (_, Some(head)) => writeln!(self.writer(), "On HEAD {}\n", head.to_short_oid())?,
            (_, None) => writeln!(self.writer(), "No commits yet\n")?,
        }

        Ok(())
    }

    fn print_changes(
        &self,
        message: &str,
        changes: &[(&PathBuf, FileChangeType)],
    ) -> anyhow::Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        writeln!(self.writer(), "{}", message)?;
        for (path, change) in changes {
            let path = match change {
                FileChangeType::Index(_) => path.display().to_string().green(),
                FileChangeType::Workspace(_) => path.display().to_string().red(),
            };
            writeln!(self.writer(), "{}{}", change, path)?;
        }
        writeln!(self.writer())?;

        Ok(())
    }

    fn print_commit_hint(&self, info: &StatusInfo) -> anyhow::Result<()> {
        if !info.index_changes.is_empty() {
            return Ok(());
        }

        if !info.workspace_changes.is_empty() {
            writeln!(self.writer(), "no changes added to commit")?;
        } else if !info.untracked.is_empty() {
            writeln!(
                self.writer(),
                "nothing added to commit but untracked files present"
            )?;
        } else {
            writeln!(self.writer(), "nothing to commit, working tree clean")?;
        }

        Ok(())
    }
}
