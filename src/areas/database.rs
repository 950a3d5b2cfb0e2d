//! Object database
//!
//! Immutable blobs, trees and commits keyed by the SHA-1 of their framed
//! content, stored zlib-compressed under `objects/<2 hex>/<38 hex>`.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::collections::BTreeMap;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: PathBuf) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store an object and return its ID.
    ///
    /// Storing the same content twice is a no-op: the existing file is left as is.
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let object_content = object.serialize()?;
        let object_id = ObjectId::digest(&object_content);
        let object_path = self.path.join(object_id.to_path());

        if object_path.exists() {
            tracing::trace!(oid = %object_id, "object already stored");
            return Ok(object_id);
        }

        let object_dir = object_path
            .parent()
            .with_context(|| format!("invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir).with_context(|| {
            format!("unable to create object directory {}", object_dir.display())
        })?;

        self.write_object(&object_path, &object_content)?;
        tracing::debug!(oid = %object_id, kind = %object.object_type(), "object stored");

        Ok(object_id)
    }

    /// Store a tree built from the index, subtrees first, returning the root ID
    pub fn store_tree(&self, tree: &Tree) -> anyhow::Result<ObjectId> {
        tree.traverse(&mut |subtree| self.store(subtree).map(|_| ()))?;

        tree.object_id()
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    /// Raw framed bytes of an object (header included)
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        let compressed = match std::fs::read(&object_path) {
            Ok(compressed) => compressed,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::ObjectNotFound(object_id.clone()).into());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("unable to read object file {}", object_path.display())
                });
            }
        };

        let content = Self::decompress(&compressed).map_err(|_| {
            RepositoryError::CorruptObject(format!("{} is not valid zlib data", object_id))
        })?;

        if ObjectId::digest(&content) != *object_id {
            return Err(RepositoryError::CorruptObject(format!(
                "{} does not match its content",
                object_id
            ))
            .into());
        }

        Ok(content)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        ObjectBox::decode(&self.load(object_id)?)
            .with_context(|| format!("unable to parse object {}", object_id))
    }

    pub fn load_blob(&self, object_id: &ObjectId) -> anyhow::Result<Blob> {
        match self.parse_object(object_id)? {
            ObjectBox::Blob(blob) => Ok(*blob),
            other => Err(Self::kind_mismatch(object_id, ObjectType::Blob, other.object_type())),
        }
    }

    pub fn load_tree(&self, object_id: &ObjectId) -> anyhow::Result<Tree> {
        match self.parse_object(object_id)? {
            ObjectBox::Tree(tree) => Ok(*tree),
            other => Err(Self::kind_mismatch(object_id, ObjectType::Tree, other.object_type())),
        }
    }

    pub fn load_commit(&self, object_id: &ObjectId) -> anyhow::Result<Commit> {
        match self.parse_object(object_id)? {
            ObjectBox::Commit(commit) => Ok(*commit),
            other => Err(Self::kind_mismatch(
                object_id,
                ObjectType::Commit,
                other.object_type(),
            )),
        }
    }

    fn kind_mismatch(object_id: &ObjectId, expected: ObjectType, actual: ObjectType) -> anyhow::Error {
        RepositoryError::CorruptObject(format!(
            "{} is a {}, expected a {}",
            object_id, actual, expected
        ))
        .into()
    }

    /// Every file reachable from a tree, keyed by its path relative to the tree.
    ///
    /// Walks subtrees with an explicit worklist; a missing subtree or a
    /// reference to a non-tree where a directory is expected is an error.
    pub fn flatten_tree(&self, tree_oid: &ObjectId) -> anyhow::Result<BTreeMap<PathBuf, DatabaseEntry>> {
        let mut files = BTreeMap::new();
        let mut pending = vec![(PathBuf::new(), tree_oid.clone())];

        while let Some((prefix, oid)) = pending.pop() {
            let tree = self.load_tree(&oid)?;

            for (name, entry) in tree.entries() {
                let path = prefix.join(name);
                if entry.is_tree() {
                    pending.push((path, entry.oid.clone()));
                } else {
                    files.insert(path, entry.clone());
                }
            }
        }

        Ok(files)
    }

    /// Every stored object whose hex ID starts with `prefix` (at least 2 chars)
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() < 2 {
            anyhow::bail!("object ID prefix '{}' is too short", prefix);
        }

        let (dir_name, file_prefix) = prefix.split_at(2);
        let dir_path = self.path.join(dir_name);
        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir_path)? {
            let file_name = entry?.file_name();
            let file_name = file_name.to_string_lossy();

            // skips temp files left behind by interrupted writes
            if file_name.len() != OBJECT_ID_LENGTH - 2 || !file_name.starts_with(file_prefix) {
                continue;
            }
            if let Ok(oid) = ObjectId::try_parse(format!("{}{}", dir_name, file_name)) {
                matches.push(oid);
            }
        }
        matches.sort();

        Ok(matches)
    }

    fn write_object(&self, object_path: &Path, object_content: &[u8]) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .with_context(|| format!("invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .with_context(|| {
                format!("unable to open object file {}", temp_object_path.display())
            })?;
        file.write_all(&object_content).with_context(|| {
            format!("unable to write object file {}", temp_object_path.display())
        })?;
        file.sync_all()?;

        // rename into place so readers never observe a partial object
        std::fs::rename(&temp_object_path, object_path).with_context(|| {
            format!("unable to rename object file to {}", object_path.display())
        })?;

        Ok(())
    }

    fn compress(data: &[u8]) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .context("unable to compress object content")?;

        encoder
            .finish()
            .map(Bytes::from)
            .context("unable to finish compressing object content")
    }

    fn decompress(data: &[u8]) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
    use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
    use crate::artifacts::objects::commit::Author;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn database() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects"));
        (dir, database)
    }

    fn stored_files(database: &Database) -> usize {
        walkdir::WalkDir::new(database.objects_path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .count()
    }

    #[rstest]
    fn storing_twice_is_idempotent(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let blob = Blob::new(Bytes::from_static(b"hello"));

        let first = database.store(&blob).unwrap();
        let second = database.store(&blob).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_ref(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert_eq!(stored_files(&database), 1);
    }

    #[rstest]
    fn stored_objects_read_back(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let blob = Blob::new(Bytes::from_static(b"\x00\x01binary"));

        let oid = database.store(&blob).unwrap();

        assert!(database.exists(&oid));
        assert_eq!(database.load_blob(&oid).unwrap(), blob);
    }

    #[rstest]
    fn missing_object_is_not_found(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let oid = ObjectId::digest(b"never stored");

        let error = database.load(&oid).unwrap_err();

        assert!(!database.exists(&oid));
        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::ObjectNotFound(missing)) if *missing == oid
        ));
    }

    #[rstest]
    fn wrong_kind_is_corrupt(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let oid = database.store(&Blob::new(Bytes::from_static(b"x"))).unwrap();

        let error = database.load_commit(&oid).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::CorruptObject(_))
        ));
    }

    #[rstest]
    fn garbage_on_disk_is_corrupt(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let oid = database.store(&Blob::new(Bytes::from_static(b"x"))).unwrap();
        std::fs::write(database.objects_path().join(oid.to_path()), b"not zlib").unwrap();

        let error = database.load(&oid).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::CorruptObject(_))
        ));
    }

    #[rstest]
    fn stored_tree_flattens_to_its_entries(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let files = [
            ("README.md", EntryMode::File(FileMode::Regular)),
            ("bin/run.sh", EntryMode::File(FileMode::Executable)),
            ("src/lib/mod.rs", EntryMode::File(FileMode::Regular)),
        ];
        let entries = files
            .iter()
            .map(|(path, mode)| {
                let oid = database
                    .store(&Blob::new(Bytes::copy_from_slice(path.as_bytes())))
                    .unwrap();
                IndexEntry::new(PathBuf::from(path), oid, EntryMetadata::from_mode(*mode))
            })
            .collect::<Vec<_>>();

        let root = database.store_tree(&Tree::build(entries.iter()).unwrap()).unwrap();
        let flattened = database.flatten_tree(&root).unwrap();

        assert_eq!(
            flattened,
            entries
                .iter()
                .map(|e| (e.name.clone(), DatabaseEntry::new(e.oid.clone(), e.metadata.mode)))
                .collect::<BTreeMap<_, _>>()
        );
    }

    #[rstest]
    fn flattening_reports_missing_subtrees(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let missing = ObjectId::digest(b"missing subtree");
        let mut tree = Tree::default();
        tree.insert("dir", DatabaseEntry::new(missing.clone(), EntryMode::Directory));
        let root = database.store(&tree).unwrap();

        let error = database.flatten_tree(&root).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::ObjectNotFound(oid)) if *oid == missing
        ));
    }

    #[rstest]
    fn prefix_lookup_is_case_insensitive(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let author = Author::new("A".into(), "a@example.com".into());
        let commit = Commit::new(None, ObjectId::digest(b"t"), author, "m".into());
        let oid = database.store(&commit).unwrap();

        assert_eq!(
            database.find_objects_by_prefix(&oid.as_ref()[..6]).unwrap(),
            vec![oid.clone()]
        );
        assert_eq!(
            database.find_objects_by_prefix(&oid.as_ref()[..6].to_uppercase()).unwrap(),
            vec![oid]
        );
    }
}
