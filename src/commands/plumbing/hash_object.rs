use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Print the blob ID of a file, storing the blob when `write` is set
    pub fn hash_object(&self, file_path: &Path, write: bool) -> anyhow::Result<()> {
        let blob = Blob::new(self.workspace().read_file(file_path)?);

        let object_id = if write {
            self.ensure_initialized()?;
            self.database().store(&blob)?
        } else {
            blob.object_id()?
        };

        writeln!(self.writer(), "{}", object_id)?;

        Ok(())
    }
}
