//! Object identifier (SHA-1 digest)
//!
//! Object IDs are 40-character lowercase hexadecimal strings. Objects are stored
//! under `objects/<first-2-chars>/<remaining-38-chars>`.

use crate::artifacts::objects::{OBJECT_ID_BYTES, OBJECT_ID_LENGTH};
use sha1::{Digest, Sha1};
use std::io;
use std::path::PathBuf;

/// Number of hex characters shown for abbreviated IDs
const SHORT_OID_LENGTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Digest arbitrary bytes.
    ///
    /// Identical input always yields the identical ID.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);

        ObjectId(format!("{:x}", hasher.finalize()))
    }

    /// Parse and validate an object ID from its hex form
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            anyhow::bail!("Invalid object ID length: {}", id.len());
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid object ID characters: {}", id);
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Write the ID as 20 raw bytes (tree entries and index entries use this form)
    pub fn write_h40_to<W: io::Write + ?Sized>(&self, writer: &mut W) -> anyhow::Result<()> {
        let bytes = (0..OBJECT_ID_LENGTH)
            .step_by(2)
            .map(|i| u8::from_str_radix(&self.0[i..i + 2], 16))
            .collect::<Result<Vec<u8>, _>>()?;

        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Read an ID from 20 raw bytes
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut buffer = [0u8; OBJECT_ID_BYTES];
        reader.read_exact(&mut buffer)?;

        let hex40 = buffer.iter().map(|b| format!("{b:02x}")).collect::<String>();
        Self::try_parse(hex40)
    }

    /// Relative path of the object file, split as `ab/cdef...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    pub fn to_short_oid(&self) -> String {
        self.0[..SHORT_OID_LENGTH].to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
