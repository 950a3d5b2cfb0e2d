//! Command implementations
//!
//! Every command is an `impl Repository` block, split in two layers:
//!
//! - `plumbing`: low-level object access (hash-object, cat-file)
//! - `porcelain`: the version control workflow (init, add, commit, log, etc.)
//!
//! Commands load the index at their start and flush it at their end; output
//! goes to the repository writer.

pub mod plumbing;
pub mod porcelain;
