use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::RepositoryError;
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub marker: String,
    pub version: u32,
    pub entries_count: u32,
}

impl IndexHeader {
    pub fn empty() -> Self {
        IndexHeader::new(String::from(SIGNATURE), VERSION, 0)
    }

    /// Reject files written by something other than this version of the index
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.marker != SIGNATURE {
            return Err(RepositoryError::CorruptIndex(format!(
                "invalid signature '{}'",
                self.marker
            ))
            .into());
        }
        if self.version != VERSION {
            return Err(RepositoryError::CorruptIndex(format!(
                "unsupported version {}",
                self.version
            ))
            .into());
        }

        Ok(())
    }
}

impl Packable for IndexHeader {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.write_all(self.marker.as_bytes())?;
        bytes.write_u32::<NetworkEndian>(self.version)?;
        bytes.write_u32::<NetworkEndian>(self.entries_count)?;

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for IndexHeader {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut marker = [0u8; 4];
        reader
            .read_exact(&mut marker)
            .map_err(|_| RepositoryError::CorruptIndex("truncated header".into()))?;
        let marker = String::from_utf8_lossy(&marker).into_owned();

        let version = reader.read_u32::<NetworkEndian>()?;
        let entries_count = reader.read_u32::<NetworkEndian>()?;

        Ok(IndexHeader {
            marker,
            version,
            entries_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_is_twelve_bytes() {
        let header = IndexHeader::new(SIGNATURE.into(), VERSION, 3);
        let bytes = header.serialize().unwrap();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[..4], b"MVCI");
        assert_eq!(IndexHeader::deserialize(bytes.as_ref()).unwrap(), header);
    }

    #[test]
    fn foreign_signature_is_corrupt() {
        let header = IndexHeader::new("DIRC".into(), 2, 0);

        let error = header.validate().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::CorruptIndex(_))
        ));
    }
}
