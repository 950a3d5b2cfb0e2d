//! minivc: a minimal, single-history version control engine.
//!
//! - `areas`: on-disk areas of a repository (object database, index, refs, workspace)
//! - `artifacts`: data structures and algorithms working over those areas
//! - `commands`: plumbing and porcelain operations exposed by the CLI
//! - `errors`: typed failures surfaced to callers

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
pub mod telemetry;

pub use areas::repository::Repository;
pub use errors::RepositoryError;
