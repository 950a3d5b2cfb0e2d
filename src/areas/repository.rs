//! Repository context
//!
//! Ties together the object database, index, refs and workspace of one
//! repository, along with its configuration and the writer command output
//! goes to.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::config::{CONFIG_FILE_NAME, RepositoryConfig};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::status_info::Status;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the metadata directory at the root of the working tree
pub const REPOSITORY_DIR: &str = ".minivc";

pub struct Repository {
    path: PathBuf,
    writer: RefCell<Box<dyn Write>>,
    index: RefCell<Index>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    config: RepositoryConfig,
}

impl Repository {
    /// Open the repository whose working tree is rooted at `path`, creating
    /// the directory if needed. The metadata directory itself may not exist
    /// yet; `init` creates it.
    pub fn new(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("unable to create directory {}", path.display()))?;
        let path = path
            .canonicalize()
            .with_context(|| format!("unable to resolve {}", path.display()))?;

        let git_path = path.join(REPOSITORY_DIR);
        let config = RepositoryConfig::load(&git_path.join(CONFIG_FILE_NAME))?;

        Ok(Repository {
            writer: RefCell::new(writer),
            index: RefCell::new(Index::new(git_path.join("index"))),
            database: Database::new(git_path.join("objects")),
            workspace: Workspace::new(path.clone()),
            refs: Refs::new(git_path),
            config,
            path,
        })
    }

    /// Find the repository containing `start` by walking up its ancestors
    pub fn discover(start: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .with_context(|| format!("unable to resolve {}", start.display()))?;

        let root = start
            .ancestors()
            .find(|dir| dir.join(REPOSITORY_DIR).is_dir())
            .ok_or_else(|| RepositoryError::NotARepository(start.clone()))?;
        tracing::debug!(root = %root.display(), "repository found");

        Self::new(root, writer)
    }

    /// Root of the working tree
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_path(&self) -> PathBuf {
        self.path.join(REPOSITORY_DIR)
    }

    pub fn writer(&self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn status(&self) -> Status<'_> {
        Status::new(self)
    }

    /// Commit the working tree and index reflect: the detached checkout if
    /// there is one, HEAD otherwise
    pub fn current_commit(&self) -> anyhow::Result<Option<ObjectId>> {
        match self.refs.read_checkout()? {
            Some(oid) => Ok(Some(oid)),
            None => self.refs.read_head(),
        }
    }

    /// Refuse to change the index or history while an older commit is checked out
    pub fn ensure_attached(&self) -> anyhow::Result<()> {
        match self.refs.read_checkout()? {
            Some(oid) => Err(RepositoryError::DetachedCheckout(oid).into()),
            None => Ok(()),
        }
    }

    /// Error unless the metadata directory exists
    pub fn ensure_initialized(&self) -> anyhow::Result<()> {
        if self.git_path().is_dir() {
            Ok(())
        } else {
            Err(RepositoryError::NotARepository(self.path.clone()).into())
        }
    }
}
