//! Stored object kinds
//!
//! Every piece of content lives in the object database as one of three kinds:
//!
//! - **Blob**: raw file content
//! - **Tree**: directory listing (names, modes and object IDs)
//! - **Commit**: root tree, optional parent and author metadata
//!
//! All objects share the same framing on disk: `<type> <size>\0<content>`,
//! and are identified by the SHA-1 of that framed form.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a SHA-1 hash in raw bytes
pub const OBJECT_ID_BYTES: usize = 20;
