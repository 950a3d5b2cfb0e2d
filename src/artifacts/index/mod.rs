//! Index file format
//!
//! The index (staging area) records which file versions make up the next
//! commit, together with the stat data used for fast change detection.
//!
//! ## File Format
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "MVCI" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length, sorted by path):
//!   - Fixed stat fields, object ID, path length and path
//!   - Each entry NUL-padded to 8-byte alignment
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```
//!
//! All integers are big-endian.

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "MVCI";

/// Index file format version
pub const VERSION: u32 = 1;
