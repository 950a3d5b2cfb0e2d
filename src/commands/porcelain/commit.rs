use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::RepositoryError;
use std::io::Write;

impl Repository {
    /// Commit the index with the author taken from the environment
    pub fn commit(&self, message: &str) -> anyhow::Result<ObjectId> {
        self.commit_as(message, Author::load_from_env()?)
    }

    pub fn commit_as(&self, message: &str, author: Author) -> anyhow::Result<ObjectId> {
        self.ensure_initialized()?;
        self.ensure_attached()?;

        let message = message.trim();
        if message.is_empty() {
            return Err(RepositoryError::EmptyCommitMessage.into());
        }

        let parent = self.refs().read_head()?;
        let tree_id = {
            let mut index = self.index();
            index.rehydrate()?;

            if parent.is_none() && index.is_empty() {
                return Err(RepositoryError::NothingToCommit.into());
            }
            self.database().store_tree(&Tree::build(index.entries())?)?
        };

        if let Some(parent) = &parent
            && self.database().load_commit(parent)?.tree_oid() == &tree_id
        {
            return Err(RepositoryError::NothingToCommit.into());
        }

        let is_root = match parent {
            Some(_) => "",
            None => "(root-commit) ",
        };

        let commit = Commit::new(parent, tree_id, author, message.to_string());
        let commit_id = self.database().store(&commit)?;
        self.refs().update_head(&commit_id)?;

        writeln!(
            self.writer(),
            "[{}{}] {}",
            is_root,
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(commit_id)
    }

    /// Store the tree of the current index and return its ID
    pub fn build_tree(&self) -> anyhow::Result<ObjectId> {
        self.ensure_initialized()?;

        let mut index = self.index();
        index.rehydrate()?;

        self.database().store_tree(&Tree::build(index.entries())?)
    }
}
