use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::RepositoryError;
use anyhow::Result;
use bytes::Bytes;
use std::io::{BufRead, Cursor, Read};
use std::path::PathBuf;

pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        Ok(ObjectId::digest(&content))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// Prefix `content` with the `<type> <size>\0` header shared by all kinds
pub fn frame(object_type: ObjectType, content: &[u8]) -> Bytes {
    let mut framed = format!("{} {}\0", object_type.as_str(), content.len()).into_bytes();
    framed.extend_from_slice(content);

    Bytes::from(framed)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    /// Decode a framed object of any kind.
    ///
    /// Fails with `CorruptObject` if the header is malformed or the declared size
    /// does not match the content that follows it.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(data);
        let (object_type, size) = ObjectType::parse_header(&mut reader)?;

        // the declared size is untrusted until compared with what follows
        let remaining = data.len().saturating_sub(reader.position() as usize);
        let mut content = Vec::with_capacity(size.min(remaining));
        reader.read_to_end(&mut content)?;
        if content.len() != size {
            return Err(RepositoryError::CorruptObject(format!(
                "{} declares {} bytes but holds {}",
                object_type,
                size,
                content.len()
            ))
            .into());
        }

        let reader = Cursor::new(content);
        Ok(match object_type {
            ObjectType::Blob => ObjectBox::Blob(Box::new(Blob::deserialize(reader)?)),
            ObjectType::Tree => ObjectBox::Tree(Box::new(Tree::deserialize(reader)?)),
            ObjectType::Commit => ObjectBox::Commit(Box::new(Commit::deserialize(reader)?)),
        })
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
        }
    }
}
