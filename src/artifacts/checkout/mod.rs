//! Checkout of a tree into the working directory and index
//!
//! A checkout is planned in full before anything is written: the target
//! tree is flattened, files that must go are collected, and in safe mode
//! every touched path with local changes is reported as a conflict.

pub mod conflict;
pub mod migration;
