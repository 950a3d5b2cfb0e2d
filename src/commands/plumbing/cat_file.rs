use crate::areas::repository::Repository;
use crate::artifacts::revision::Revision;
use std::io::Write;

impl Repository {
    /// Pretty-print the object a revision names
    pub fn cat_file(&self, revision: &str) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let object_id = Revision::try_parse(revision)?.resolve(self)?;
        let display = self.database().parse_object(&object_id)?.display();

        write!(self.writer(), "{}", display)?;
        if !display.is_empty() && !display.ends_with('\n') {
            writeln!(self.writer())?;
        }

        Ok(())
    }
}
