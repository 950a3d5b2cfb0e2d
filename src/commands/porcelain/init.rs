use crate::areas::repository::Repository;
use crate::artifacts::config::{CONFIG_FILE_NAME, RepositoryConfig};
use crate::errors::RepositoryError;
use anyhow::Context;
use std::fs;
use std::io::Write;

impl Repository {
    pub fn init(&self) -> anyhow::Result<()> {
        let git_path = self.git_path();
        if git_path.exists() {
            return Err(RepositoryError::AlreadyInitialized(git_path).into());
        }

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .minivc/objects directory")?;

        self.refs()
            .initialize()
            .context("Failed to create initial HEAD reference")?;

        {
            let mut index = self.index();
            index.reset_to(std::iter::empty());
            index
                .write_updates()
                .context("Failed to create .minivc/index file")?;
        }

        fs::write(
            git_path.join(CONFIG_FILE_NAME),
            RepositoryConfig::default().to_toml_string()?,
        )
        .context("Failed to create .minivc/config.toml")?;

        tracing::info!(path = %self.path().display(), "repository initialized");
        writeln!(
            self.writer(),
            "Initialized empty minivc repository in {}",
            git_path.display()
        )?;

        Ok(())
    }
}
