//! Index entry representation
//!
//! Each entry in the index represents a staged file with:
//! - File path, relative to the repository root
//! - Content hash (object ID)
//! - Cached stat data (mode, size, timestamps)
//!
//! ## Entry Format
//!
//! ```text
//! ctime, ctime_nsec, mtime, mtime_nsec, mode, size   6 x u32
//! object ID                                           20 bytes
//! path length                                         u16
//! path                                                path length bytes
//! NUL padding                                         1..=8 bytes, up to an 8-byte boundary
//! ```

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::OBJECT_ID_BYTES;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::fs::Metadata;
use std::io::{BufRead, Write};
use std::os::unix::prelude::MetadataExt;
use std::path::{Component, Path, PathBuf};

/// Block size for entry alignment
pub const ENTRY_BLOCK: usize = 8;

/// Bytes preceding the path: six stat words, the object ID and the path length
pub const ENTRY_FIXED_SIZE: usize = 6 * 4 + OBJECT_ID_BYTES + 2;

/// Total on-disk size of an entry whose path is `path_len` bytes long
pub fn entry_size(path_len: usize) -> usize {
    (ENTRY_FIXED_SIZE + path_len + ENTRY_BLOCK) / ENTRY_BLOCK * ENTRY_BLOCK
}

#[derive(Debug, Clone, Default, PartialEq, Eq, new)]
pub struct IndexEntry {
    pub name: PathBuf,
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    pub fn basename(&self) -> anyhow::Result<&str> {
        self.name
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("invalid file name {:?}", self.name))
    }

    /// Every ancestor directory of the entry, outermost first
    pub fn parent_dirs(&self) -> Vec<&Path> {
        let mut dirs = self
            .name
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();

        dirs
    }

    pub fn stat_match(&self, other: &EntryMetadata) -> bool {
        self.metadata.size == other.size && self.metadata.mode == other.mode
    }

    pub fn times_match(&self, other: &EntryMetadata) -> bool {
        self.metadata.ctime == other.ctime
            && self.metadata.ctime_nsec == other.ctime_nsec
            && self.metadata.mtime == other.mtime
            && self.metadata.mtime_nsec == other.mtime_nsec
    }
}

/// Stat data cached in index entries
///
/// Values are kept at the width they are stored with, so a freshly taken stat
/// compares equal to one read back from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: u32,
    pub ctime_nsec: u32,
    pub mtime: u32,
    pub mtime_nsec: u32,
    pub mode: EntryMode,
    pub size: u32,
}

impl EntryMetadata {
    /// Metadata carrying only a mode, used for entries restored from a tree.
    /// Zeroed timestamps force the next status check to rehash the file.
    pub fn from_mode(mode: EntryMode) -> Self {
        EntryMetadata {
            mode,
            ..Default::default()
        }
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let name = self
            .name
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non UTF-8 path {:?}", self.name))?;
        let name_len = u16::try_from(name.len())
            .map_err(|_| anyhow::anyhow!("path too long for the index: {}", name))?;

        let mut entry_bytes = Vec::with_capacity(entry_size(name.len()));
        entry_bytes.write_u32::<NetworkEndian>(self.metadata.ctime)?;
        entry_bytes.write_u32::<NetworkEndian>(self.metadata.ctime_nsec)?;
        entry_bytes.write_u32::<NetworkEndian>(self.metadata.mtime)?;
        entry_bytes.write_u32::<NetworkEndian>(self.metadata.mtime_nsec)?;
        entry_bytes.write_u32::<NetworkEndian>(self.metadata.mode.as_u32())?;
        entry_bytes.write_u32::<NetworkEndian>(self.metadata.size)?;
        self.oid.write_h40_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<NetworkEndian>(name_len)?;
        entry_bytes.write_all(name.as_bytes())?;

        // at least one NUL, then pad to the block size
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let corrupt = |message: &str| RepositoryError::CorruptIndex(message.to_string());

        let ctime = reader.read_u32::<NetworkEndian>()?;
        let ctime_nsec = reader.read_u32::<NetworkEndian>()?;
        let mtime = reader.read_u32::<NetworkEndian>()?;
        let mtime_nsec = reader.read_u32::<NetworkEndian>()?;
        let mode = EntryMode::try_from(reader.read_u32::<NetworkEndian>()?)
            .map_err(|_| corrupt("invalid entry mode"))?;
        if mode.is_tree() {
            return Err(corrupt("directory entries cannot be staged").into());
        }
        let size = reader.read_u32::<NetworkEndian>()?;
        let oid = ObjectId::read_h40_from(&mut reader)?;

        let name_len = reader.read_u16::<NetworkEndian>()? as usize;
        let mut name = vec![0u8; name_len];
        reader.read_exact(&mut name)?;
        let name = String::from_utf8(name).map_err(|_| corrupt("non UTF-8 entry path"))?;
        let name = PathBuf::from(name);

        let is_normalized = name.components().count() > 0
            && name
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_normalized {
            return Err(corrupt(&format!("invalid entry path {:?}", name)).into());
        }

        let mut padding = Vec::new();
        reader.read_to_end(&mut padding)?;
        if padding.is_empty() || padding.iter().any(|b| *b != 0) {
            return Err(corrupt("invalid entry padding").into());
        }

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                mode,
                size,
            },
        })
    }
}

impl TryFrom<(&Path, Metadata)> for EntryMetadata {
    type Error = anyhow::Error;

    /// Build from the stat of `file_path`, an absolute path into the workspace
    fn try_from((file_path, metadata): (&Path, Metadata)) -> Result<Self, Self::Error> {
        let mode = if metadata.is_dir() {
            EntryMode::Directory
        } else if file_path.is_executable() {
            EntryMode::File(FileMode::Executable)
        } else {
            EntryMode::File(FileMode::Regular)
        };

        Ok(Self {
            ctime: metadata.ctime() as u32,
            ctime_nsec: metadata.ctime_nsec() as u32,
            mtime: metadata.mtime() as u32,
            mtime_nsec: metadata.mtime_nsec() as u32,
            mode,
            size: metadata.size() as u32,
        })
    }
}
