//! Commit object
//!
//! Commits snapshot the repository: a root tree, at most one parent, the
//! author and a message. History is a single linear chain.
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable, frame};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Timelike};
use std::io::BufRead;

pub const AUTHOR_NAME_VAR: &str = "MINIVC_AUTHOR_NAME";
pub const AUTHOR_EMAIL_VAR: &str = "MINIVC_AUTHOR_EMAIL";
pub const AUTHOR_DATE_VAR: &str = "MINIVC_AUTHOR_DATE";

/// Author information
///
/// Contains name, email, and timestamp with timezone information.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Author {
    /// Create a new author stamped with the current local time.
    ///
    /// Sub-second precision is dropped since the serialized form only keeps
    /// whole seconds.
    pub fn new(name: String, email: String) -> Self {
        let now = chrono::Local::now().fixed_offset();
        let timestamp = now.with_nanosecond(0).unwrap_or(now);

        Self::new_with_timestamp(name, email, timestamp)
    }

    /// The name is trimmed, as the stored author line cannot keep
    /// surrounding whitespace.
    pub fn new_with_timestamp(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Author {
            name: name.trim().to_string(),
            email,
            timestamp,
        }
    }

    /// "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// "Name <email> timestamp timezone", as stored in the commit
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load author information from environment variables
    ///
    /// Reads `MINIVC_AUTHOR_NAME`, `MINIVC_AUTHOR_EMAIL` and optionally
    /// `MINIVC_AUTHOR_DATE` (RFC 2822 or `%Y-%m-%d %H:%M:%S %z`). Without a
    /// date the current time is used.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = Self::required_var(AUTHOR_NAME_VAR)?;
        let email = Self::required_var(AUTHOR_EMAIL_VAR)?;

        let timestamp = match std::env::var(AUTHOR_DATE_VAR) {
            Ok(date) => Some(Self::parse_date(&date)?),
            Err(_) => None,
        };

        Ok(match timestamp {
            Some(ts) => Author::new_with_timestamp(name, email, ts),
            None => Author::new(name, email),
        })
    }

    fn required_var(var: &'static str) -> anyhow::Result<String> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(RepositoryError::MissingAuthor(var).into()),
        }
    }

    fn parse_date(date: &str) -> anyhow::Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(date)
            .or_else(|_| DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z"))
            .with_context(|| format!("invalid {} '{}'", AUTHOR_DATE_VAR, date))
    }

    /// "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // "name <email> timestamp timezone", split from the right
        let mut parts = value.rsplitn(3, ' ');
        let (Some(timezone), Some(timestamp), Some(name_email)) =
            (parts.next(), parts.next(), parts.next())
        else {
            anyhow::bail!("invalid author line '{}'", value);
        };

        let timestamp = timestamp
            .parse::<i64>()
            .with_context(|| format!("invalid author timestamp '{}'", timestamp))?;

        let email_start = name_email
            .find('<')
            .context("invalid author: missing '<'")?;
        let email_end = name_email
            .rfind('>')
            .filter(|end| *end > email_start)
            .context("invalid author: missing '>'")?;

        let name = name_email[..email_start].trim().to_string();
        let email = name_email[email_start + 1..email_end].to_string();

        let offset = DateTime::parse_from_str(&format!("1970-01-01 00:00:00 {timezone}"), "%Y-%m-%d %H:%M:%S %z")
            .with_context(|| format!("invalid author timezone '{}'", timezone))?
            .offset()
            .to_owned();
        let timestamp = DateTime::from_timestamp(timestamp, 0)
            .context("author timestamp out of range")?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// None for the root commit
    parent: Option<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    message: String,
}

impl Commit {
    pub fn new(parent: Option<ObjectId>, tree_oid: ObjectId, author: Author, message: String) -> Self {
        Commit {
            parent,
            tree_oid,
            author,
            message,
        }
    }

    /// First line of the message, used by `log --oneline`
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.author.timestamp()
    }

    fn parse(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let content = String::from_utf8(content).context("commit is not valid UTF-8")?;

        // headers end at the first blank line; the message is kept verbatim
        let (headers, message) = content
            .split_once("\n\n")
            .context("missing blank line before message")?;
        let mut lines = headers.lines();

        let tree_oid = lines
            .next()
            .and_then(|line| line.strip_prefix("tree "))
            .context("missing tree line")?;
        let tree_oid = ObjectId::try_parse(tree_oid.to_string())?;

        let mut next_line = lines.next().context("missing author line")?;
        let parent = match next_line.strip_prefix("parent ") {
            Some(parent) => {
                next_line = lines.next().context("missing author line")?;
                Some(ObjectId::try_parse(parent.to_string())?)
            }
            None => None,
        };

        let author = next_line
            .strip_prefix("author ")
            .context("invalid author line")?;
        let author = Author::try_from(author)?;

        if let Some(extra) = lines.next() {
            anyhow::bail!("unexpected commit header '{}'", extra);
        }

        Ok(Self::new(parent, tree_oid, author, message.to_string()))
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(frame(self.object_type(), self.display().as_bytes()))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        Self::parse(reader).map_err(|e| RepositoryError::CorruptObject(format!("{e:#}")).into())
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        if let Some(parent) = &self.parent {
            lines.push(format!("parent {}", parent));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn author() -> Author {
        let timestamp = DateTime::parse_from_rfc3339("2024-03-05T09:30:00-05:00").unwrap();
        Author::new_with_timestamp("Ada".into(), "ada@example.com".into(), timestamp)
    }

    #[test]
    fn root_commit_has_no_parent_line() {
        let commit = Commit::new(None, ObjectId::digest(b"t"), author(), "init".into());

        let display = commit.display();
        assert!(!display.contains("parent"));
        assert_eq!(
            display.lines().nth(1).unwrap(),
            "author Ada <ada@example.com> 1709649000 -0500"
        );
    }

    #[test]
    fn author_line_keeps_its_offset() {
        let parsed = Author::try_from("Ada <ada@example.com> 1709649000 -0500").unwrap();

        assert_eq!(parsed, author());
        assert_eq!(parsed.readable_timestamp(), "Tue Mar 5 09:30:00 2024 -0500");
    }

    #[rstest]
    #[case::missing_email("Ada 1709649000 +0000")]
    #[case::bad_timestamp("Ada <ada@example.com> yesterday +0000")]
    #[case::bad_timezone("Ada <ada@example.com> 1709649000 Z")]
    fn malformed_author_lines_are_rejected(#[case] line: &str) {
        assert!(Author::try_from(line).is_err());
    }

    #[test]
    fn short_message_is_the_first_line() {
        let commit = Commit::new(None, ObjectId::digest(b"t"), author(), "Fix it\n\nDetails".into());

        assert_eq!(commit.short_message(), "Fix it");
    }

    #[test]
    fn padded_author_names_survive_decoding() {
        let timestamp = DateTime::parse_from_rfc3339("2024-03-05T09:30:00-05:00").unwrap();
        let padded = Author::new_with_timestamp(" Ada  ".into(), "ada@example.com".into(), timestamp);
        let commit = Commit::new(None, ObjectId::digest(b"t"), padded, "init".into());

        let decoded = Commit::deserialize(std::io::Cursor::new(commit.display())).unwrap();

        assert_eq!(decoded, commit);
        assert_eq!(decoded.author(), &author());
    }

    #[test]
    fn new_author_has_whole_second_timestamp() {
        let author = Author::new("A".into(), "a@b".into());

        assert_eq!(author.timestamp().nanosecond(), 0);
    }
}
