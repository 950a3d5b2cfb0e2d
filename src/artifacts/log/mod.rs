//! Commit history traversal
//!
//! History is a single chain: every commit has at most one parent, so
//! walking it is a matter of following parent links from a start commit
//! until the root.

pub mod rev_list;
