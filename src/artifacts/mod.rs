//! Data structures and algorithms
//!
//! - `checkout`: working tree migration and conflict detection
//! - `config`: repository configuration file
//! - `core`: shared utilities (pager wrapper)
//! - `database`: entries of stored trees
//! - `index`: index file format
//! - `log`: commit history traversal
//! - `objects`: stored object kinds (blob, tree, commit)
//! - `revision`: revision parsing and resolution
//! - `status`: working tree status inspection

pub mod checkout;
pub mod config;
pub mod core;
pub mod database;
pub mod index;
pub mod log;
pub mod objects;
pub mod revision;
pub mod status;
