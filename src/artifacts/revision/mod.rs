//! Revision parsing and resolution
//!
//! A revision names a commit either as `HEAD` (any case) or as a 4 to 40
//! character hexadecimal prefix of a stored object ID.

use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use anyhow::Context;

pub const HEAD_REVISION: &str = "HEAD";
pub const OBJECT_PREFIX_REGEX: &str = r"^[0-9a-fA-F]{4,40}$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// Tip of the history
    Head,
    /// Abbreviated or full object ID, lowercased
    Prefix(String),
}

impl Revision {
    pub fn try_parse(revision: &str) -> anyhow::Result<Revision> {
        let revision = revision.trim();

        if revision.eq_ignore_ascii_case(HEAD_REVISION) {
            return Ok(Revision::Head);
        }

        let prefix_regex = regex::Regex::new(OBJECT_PREFIX_REGEX)
            .with_context(|| format!("invalid object prefix regex: {OBJECT_PREFIX_REGEX}"))?;
        if prefix_regex.is_match(revision) {
            Ok(Revision::Prefix(revision.to_ascii_lowercase()))
        } else {
            Err(RepositoryError::UnknownRevision(revision.to_string()).into())
        }
    }

    /// Resolve to the object ID the revision names, whatever its kind
    pub fn resolve(&self, repository: &Repository) -> anyhow::Result<ObjectId> {
        match self {
            Revision::Head => Self::resolve_head(repository),
            Revision::Prefix(prefix) => {
                let matches = repository.database().find_objects_by_prefix(prefix)?;
                Self::unique_match(prefix, matches)
            }
        }
    }

    /// Resolve to a commit ID. Prefixes are only matched against commits, so
    /// trees and blobs sharing the prefix do not make it ambiguous.
    pub fn resolve_commit(&self, repository: &Repository) -> anyhow::Result<ObjectId> {
        let prefix = match self {
            Revision::Head => return Self::resolve_head(repository),
            Revision::Prefix(prefix) => prefix,
        };

        let matches = repository.database().find_objects_by_prefix(prefix)?;
        let mut commits = Vec::with_capacity(matches.len());
        for oid in &matches {
            if repository.database().parse_object(oid)?.object_type() == ObjectType::Commit {
                commits.push(oid.clone());
            }
        }

        match (commits.is_empty(), matches.as_slice()) {
            (true, [only]) => Err(RepositoryError::NotACommit(only.clone()).into()),
            (true, _) => Err(RepositoryError::UnknownRevision(prefix.clone()).into()),
            (false, _) => Self::unique_match(prefix, commits),
        }
    }

    fn resolve_head(repository: &Repository) -> anyhow::Result<ObjectId> {
        repository
            .refs()
            .read_head()?
            .ok_or_else(|| RepositoryError::NoCommits.into())
    }

    fn unique_match(prefix: &str, mut matches: Vec<ObjectId>) -> anyhow::Result<ObjectId> {
        match matches.len() {
            0 => Err(RepositoryError::UnknownRevision(prefix.to_string()).into()),
            1 => Ok(matches.remove(0)),
            _ => Err(RepositoryError::AmbiguousRevision {
                prefix: prefix.to_string(),
                candidates: matches,
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("HEAD", Revision::Head)]
    #[case("head", Revision::Head)]
    #[case(" Head ", Revision::Head)]
    #[case("abcd", Revision::Prefix("abcd".into()))]
    #[case("ABCDEF0123", Revision::Prefix("abcdef0123".into()))]
    #[case(
        "0123456789abcdef0123456789abcdef01234567",
        Revision::Prefix("0123456789abcdef0123456789abcdef01234567".into())
    )]
    fn parses_valid_revisions(#[case] input: &str, #[case] expected: Revision) {
        assert_eq!(Revision::try_parse(input).unwrap(), expected);
    }

    #[rstest]
    #[case("abc")]
    #[case("master")]
    #[case("HEAD^")]
    #[case("g123")]
    #[case("0123456789abcdef0123456789abcdef012345678")]
    fn rejects_unknown_revisions(#[case] input: &str) {
        let error = Revision::try_parse(input).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::UnknownRevision(_))
        ));
    }
}
