//! Core repository components
//!
//! - `database`: object database for blobs, trees and commits
//! - `index`: staging area
//! - `refs`: HEAD and the detached checkout marker
//! - `repository`: the context tying the areas together
//! - `workspace`: working directory access

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
