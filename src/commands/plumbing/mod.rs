//! Plumbing commands
//!
//! - `hash-object`: compute a file's blob ID, optionally storing it
//! - `cat-file`: pretty-print a stored object

pub mod cat_file;
pub mod hash_object;
