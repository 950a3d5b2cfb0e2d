//! Entries read back from stored trees, pairing an object ID with its mode.

pub mod database_entry;
