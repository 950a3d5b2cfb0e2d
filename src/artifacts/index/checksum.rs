//! Checksummed access to the locked index file.
//!
//! Every byte read or written goes through the running SHA-1 digest so the
//! trailer can be produced or verified at the end.

use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::RepositoryError;
use bytes::Bytes;
use file_guard::FileGuard;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{Read, Write};
use std::ops::DerefMut;

pub struct Checksum<'f> {
    file: FileGuard<&'f mut File>,
    digest: Sha1,
}

impl<'f> Checksum<'f> {
    pub fn new(file: FileGuard<&'f mut File>) -> Self {
        Checksum {
            file,
            digest: Sha1::new(),
        }
    }

    pub fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.file
            .deref_mut()
            .read_exact(&mut buffer)
            .map_err(|_| RepositoryError::CorruptIndex("unexpected end of file".into()))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    pub fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.file.deref_mut().write_all(data)?;
        self.digest.update(data);
        Ok(())
    }

    pub fn write_checksum(&mut self) -> anyhow::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.file.deref_mut().write_all(checksum.as_slice())?;
        self.file.deref_mut().flush()?;

        Ok(())
    }

    /// Compare the stored trailer with the digest of everything read so far.
    /// Trailing bytes after the checksum also count as corruption.
    pub fn verify(&mut self) -> anyhow::Result<()> {
        let mut expected = [0u8; CHECKSUM_SIZE];
        self.file
            .deref_mut()
            .read_exact(&mut expected)
            .map_err(|_| RepositoryError::CorruptIndex("missing checksum".into()))?;

        if expected != self.digest.clone().finalize().as_slice() {
            return Err(RepositoryError::CorruptIndex(
                "checksum does not match value stored on disk".into(),
            )
            .into());
        }

        let mut rest = Vec::new();
        self.file.deref_mut().read_to_end(&mut rest)?;
        if !rest.is_empty() {
            return Err(
                RepositoryError::CorruptIndex("unexpected data after checksum".into()).into(),
            );
        }

        Ok(())
    }
}
