//! Repository error kinds.
//!
//! Operations return `anyhow::Result` and attach context as they propagate;
//! the failures a caller may want to react to are raised as [`RepositoryError`]
//! values, so they can be recovered with `anyhow::Error::downcast_ref`.

use crate::artifacts::checkout::conflict::ConflictsSet;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A referenced digest is absent from the object database.
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    /// Stored or supplied object bytes do not match the expected layout.
    #[error("corrupt object: {0}")]
    CorruptObject(String),

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("path '{}' is not staged", .0.display())]
    PathNotStaged(PathBuf),

    #[error("pathspec '{}' did not match any files", .0.display())]
    PathNotFound(PathBuf),

    #[error("path '{}' is outside the repository", .0.display())]
    InvalidPath(PathBuf),

    #[error("nothing to commit, working tree matches the last commit")]
    NothingToCommit,

    #[error("aborting commit due to empty commit message")]
    EmptyCommitMessage,

    #[error("author identity unknown: {0} is not set")]
    MissingAuthor(&'static str),

    #[error("repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("not a minivc repository (or any of the parent directories): {}", .0.display())]
    NotARepository(PathBuf),

    /// Checkout in safe mode would discard local changes.
    #[error("checkout would discard local changes:\n{}\nPlease commit your changes before checking out.", format_conflicts(.0))]
    WorkingTreeConflict(ConflictsSet),

    /// An older commit is checked out; history can only grow from HEAD.
    #[error("HEAD is not checked out (working tree is at {}); run `checkout HEAD` first", .0.to_short_oid())]
    DetachedCheckout(ObjectId),

    #[error("no commits yet")]
    NoCommits,

    #[error("unknown revision '{0}'")]
    UnknownRevision(String),

    #[error("short object ID {prefix} is ambiguous; candidates are:\n{}", format_candidates(.candidates))]
    AmbiguousRevision {
        prefix: String,
        candidates: Vec<ObjectId>,
    },

    #[error("object {0} is not a commit")]
    NotACommit(ObjectId),

    #[error("invalid configuration in {}: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },
}

fn format_conflicts(conflicts: &ConflictsSet) -> String {
    conflicts
        .iter()
        .map(|(path, conflict)| format!("\t{}: {}", conflict, path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_candidates(candidates: &[ObjectId]) -> String {
    candidates
        .iter()
        .map(|oid| format!("\t{}", oid))
        .collect::<Vec<_>>()
        .join("\n")
}
