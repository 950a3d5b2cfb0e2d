//! Porcelain commands
//!
//! - `init`: create the repository layout
//! - `add`: stage files, or the deletion of tracked files
//! - `remove`: unstage files, optionally deleting them
//! - `commit`: record the index as a new commit on HEAD
//! - `status`: compare the checked-out commit, index and working tree
//! - `log`: show the history reachable from HEAD
//! - `checkout`: move the working tree to a commit without moving HEAD
//! - `reset`: move HEAD, index and working tree to a commit

pub mod add;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod remove;
pub mod reset;
pub mod status;
