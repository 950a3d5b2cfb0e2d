use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub oneline: bool,
    pub abbrev_commit: bool,
}

impl Repository {
    /// Commits reachable from HEAD, newest first
    pub fn history(&self) -> anyhow::Result<Vec<(ObjectId, Commit)>> {
        self.ensure_initialized()?;

        RevList::new(self, self.refs().read_head()?)
            .into_iter()
            .collect()
    }

    pub fn log(&self, opts: &LogOptions) -> anyhow::Result<()> {
        let history = self.history()?;

        let noun = if history.len() == 1 { "commit" } else { "commits" };
        writeln!(self.writer(), "{} {}", history.len(), noun)?;

        for (commit_oid, commit) in &history {
            if opts.oneline {
                self.show_commit_oneline(commit_oid, commit)?;
            } else {
                writeln!(self.writer())?;
                self.show_commit_medium(commit_oid, commit, opts.abbrev_commit)?;
            }
        }

        Ok(())
    }

    fn show_commit_medium(
        &self,
        commit_oid: &ObjectId,
        commit: &Commit,
        abbrev_commit: bool,
    ) -> anyhow::Result<()> {
        let commit_id = Self::abbrev_commit_id(commit_oid, abbrev_commit);

        writeln!(self.writer(), "{}", format!("commit {}", commit_id).yellow())?;
        writeln!(self.writer(), "Author: {}", commit.author().display_name())?;
        writeln!(
            self.writer(),
            "Date:   {}",
            commit.author().readable_timestamp()
        )?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {}", message_line)?;
        }

        Ok(())
    }

    fn show_commit_oneline(&self, commit_oid: &ObjectId, commit: &Commit) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{} {}",
            Self::abbrev_commit_id(commit_oid, true).yellow(),
            commit.short_message()
        )?;

        Ok(())
    }

    fn abbrev_commit_id(commit_oid: &ObjectId, abbrev_commit: bool) -> String {
        if abbrev_commit {
            commit_oid.to_short_oid()
        } else {
            commit_oid.as_ref().to_string()
        }
    }
}
