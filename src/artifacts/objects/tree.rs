//! Tree object
//!
//! Trees are directory snapshots: a name-ordered list of entries, each pointing
//! at a blob (file) or another tree (subdirectory).
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<octal-mode> <name>\0<20-byte-sha1>`
//!
//! ## Tree Building
//!
//! A tree built from index entries nests subtrees in memory; each subtree's ID
//! is only known once its own content is serialized. A tree read back from the
//! database holds flat entries only, subdirectories included as `40000` entries.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Object, Packable, Unpackable, frame};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Component, Path};

#[derive(Debug, Clone, PartialEq)]
enum TreeEntry {
    /// Reference to an already stored object
    Stored(DatabaseEntry),
    /// Subdirectory built in memory, not yet hashed
    Subtree(Tree),
}

impl TreeEntry {
    fn mode(&self) -> EntryMode {
        match self {
            TreeEntry::Stored(entry) => entry.mode,
            TreeEntry::Subtree(_) => EntryMode::Directory,
        }
    }

    fn oid(&self) -> anyhow::Result<ObjectId> {
        match self {
            TreeEntry::Stored(entry) => Ok(entry.oid.clone()),
            TreeEntry::Subtree(tree) => tree.object_id(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    /// Keyed by entry name; `BTreeMap` gives the canonical serialization order
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build a nested tree from a flat list of index entries.
    ///
    /// The result depends only on the set of (path, mode, oid) triples, never on
    /// the order the entries are supplied in.
    pub fn build<'e>(entries: impl IntoIterator<Item = &'e IndexEntry>) -> anyhow::Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let components = Self::path_components(&entry.name)?;
            let (name, parents) = components
                .split_last()
                .with_context(|| format!("empty index path {:?}", entry.name))?;

            root.add_entry(
                parents,
                name,
                DatabaseEntry::new(entry.oid.clone(), entry.metadata.mode),
            );
        }

        Ok(root)
    }

    fn path_components(path: &Path) -> anyhow::Result<Vec<&str>> {
        path.components()
            .map(|component| match component {
                Component::Normal(name) => name
                    .to_str()
                    .with_context(|| format!("non UTF-8 path {:?}", path)),
                _ => Err(RepositoryError::InvalidPath(path.to_path_buf()).into()),
            })
            .collect()
    }

    fn add_entry(&mut self, parents: &[&str], name: &str, entry: DatabaseEntry) {
        match parents.split_first() {
            None => {
                self.entries
                    .insert(name.to_string(), TreeEntry::Stored(entry));
            }
            Some((parent, rest)) => {
                let subtree = self
                    .entries
                    .entry(parent.to_string())
                    .and_modify(|existing| {
                        if !matches!(existing, TreeEntry::Subtree(_)) {
                            *existing = TreeEntry::Subtree(Tree::default());
                        }
                    })
                    .or_insert_with(|| TreeEntry::Subtree(Tree::default()));

                if let TreeEntry::Subtree(tree) = subtree {
                    tree.add_entry(rest, name, entry);
                }
            }
        }
    }

    /// Insert a reference to a stored object directly under this tree
    pub fn insert(&mut self, name: &str, entry: DatabaseEntry) {
        self.entries
            .insert(name.to_string(), TreeEntry::Stored(entry));
    }

    /// Visit every subtree before its parent (post-order).
    ///
    /// Storing trees in this order guarantees a parent never references an
    /// object that has not been written yet.
    pub fn traverse<F>(&self, func: &mut F) -> anyhow::Result<()>
    where
        F: FnMut(&Tree) -> anyhow::Result<()>,
    {
        for entry in self.entries.values() {
            if let TreeEntry::Subtree(tree) = entry {
                tree.traverse(func)?;
            }
        }

        func(self)
    }

    /// Entries of a tree read back from the database
    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.entries.iter().filter_map(|(name, entry)| match entry {
            TreeEntry::Stored(entry) => Some((name, entry)),
            TreeEntry::Subtree(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn parse_entries(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut tree = Tree::default();
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            if reader.read_until(b' ', &mut mode_bytes)? == 0 {
                break;
            }
            if mode_bytes.pop() != Some(b' ') {
                anyhow::bail!("unexpected end of tree in entry mode");
            }
            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                anyhow::bail!("unexpected end of tree in entry name");
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();
            if name.is_empty() || name == "." || name == ".." || name.contains('/') {
                anyhow::bail!("invalid tree entry name {:?}", name);
            }

            let oid = ObjectId::read_h40_from(&mut reader)
                .context("unexpected end of tree in object id")?;

            if tree.entries.contains_key(&name) {
                anyhow::bail!("duplicate tree entry {:?}", name);
            }
            tree.insert(&name, DatabaseEntry::new(oid, mode));
        }

        Ok(tree)
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content = Vec::new();

        for (name, entry) in &self.entries {
            write!(content, "{:o} {}", entry.mode().as_u32(), name)?;
            content.push(0);
            entry.oid()?.write_h40_to(&mut content)?;
        }

        Ok(frame(self.object_type(), &content))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        Self::parse_entries(reader)
            .map_err(|e| RepositoryError::CorruptObject(format!("{e:#}")).into())
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(name, entry)| {
                let object_type = if entry.mode().is_tree() {
                    ObjectType::Tree
                } else {
                    ObjectType::Blob
                };

                format!(
                    "{:0>6} {} {}\t{}",
                    entry.mode().as_str(),
                    object_type,
                    entry.oid().unwrap_or_default(),
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
