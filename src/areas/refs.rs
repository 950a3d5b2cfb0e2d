//! References
//!
//! The repository keeps two single-line reference files:
//!
//! - `HEAD`: tip of the linear history, empty before the first commit
//! - `CHECKOUT`: commit the working tree reflects while an older commit is
//!   checked out; absent when the working tree follows `HEAD`

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

pub const HEAD_REF_NAME: &str = "HEAD";
pub const CHECKOUT_REF_NAME: &str = "CHECKOUT";

#[derive(Debug, new)]
pub struct Refs {
    /// Repository metadata directory (`.minivc`)
    path: PathBuf,
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn checkout_path(&self) -> PathBuf {
        self.path.join(CHECKOUT_REF_NAME)
    }

    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        Self::read_ref_file(&self.head_path())
    }

    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        Self::update_ref_file(&self.head_path(), oid.as_ref())?;
        tracing::info!(head = %oid, "HEAD moved");

        Ok(())
    }

    pub fn read_checkout(&self) -> anyhow::Result<Option<ObjectId>> {
        Self::read_ref_file(&self.checkout_path())
    }

    /// Record the detached checkout, or clear it with `None`
    pub fn set_checkout(&self, oid: Option<&ObjectId>) -> anyhow::Result<()> {
        let path = self.checkout_path();

        match oid {
            Some(oid) => Self::update_ref_file(&path, oid.as_ref()),
            None => match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e)
                    .with_context(|| format!("failed to remove ref file at {:?}", path)),
            },
        }
    }

    /// Create an empty `HEAD`
    pub fn initialize(&self) -> anyhow::Result<()> {
        Self::update_ref_file(&self.head_path(), "")
    }

    fn read_ref_file(path: &Path) -> anyhow::Result<Option<ObjectId>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read ref file at {:?}", path));
            }
        };
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        ObjectId::try_parse(content.to_string())
            .map(Some)
            .with_context(|| format!("invalid ref file at {:?}", path))
    }

    fn update_ref_file(path: &Path, raw_ref: &str) -> anyhow::Result<()> {
        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;

        lock.deref_mut().write_all(raw_ref.as_bytes())?;
        if !raw_ref.is_empty() {
            lock.deref_mut().write_all(b"\n")?;
        }

        Ok(())
    }
}
