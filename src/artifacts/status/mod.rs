//! Working tree status
//!
//! Reconciles the checked-out commit, the index and the working directory.
//!
//! - `file_change`: change kinds and their labels
//! - `inspector`: per-path comparisons between the three trees
//! - `status_info`: the workspace scan and the resulting change sets

pub mod file_change;
pub mod inspector;
pub mod status_info;
