//! Repository configuration (`.minivc/config.toml`)
//!
//! ```toml
//! [checkout]
//! mode = "force"      # or "safe"
//!
//! [remove]
//! delete_working_files = false
//! ```
//!
//! A missing file means all defaults; unknown keys are rejected.

use crate::errors::RepositoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub remove: RemoveConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub mode: CheckoutMode,
}

/// How checkout treats local changes in paths it is about to overwrite
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutMode {
    /// Overwrite without looking
    #[default]
    Force,
    /// Refuse with `WorkingTreeConflict` if any touched path has local changes
    Safe,
}

impl fmt::Display for CheckoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Force => write!(f, "force"),
            Self::Safe => write!(f, "safe"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveConfig {
    /// Also delete the working file when unstaging
    #[serde(default)]
    pub delete_working_files: bool,
}

impl RepositoryConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(RepositoryError::InvalidConfig {
                    path: path.to_owned(),
                    message: format!("could not read file: {e}"),
                }
                .into());
            }
        };

        Self::parse(&contents).map_err(|message| {
            RepositoryError::InvalidConfig {
                path: path.to_owned(),
                message,
            }
            .into()
        })
    }

    /// Parse configuration from TOML, reporting the offending line on error
    pub fn parse(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e: toml::de::Error| {
            let message = e.message().to_owned();
            match e.span() {
                Some(span) => {
                    let line = toml_str[..span.start].matches('\n').count() + 1;
                    format!("line {line}: {message}")
                }
                None => message,
            }
        })
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_string_is_default() {
        assert_eq!(RepositoryConfig::parse("").unwrap(), RepositoryConfig::default());
    }

    #[test]
    fn parses_every_setting() {
        let config = RepositoryConfig::parse(
            r#"
[checkout]
mode = "safe"

[remove]
delete_working_files = true
"#,
        )
        .unwrap();

        assert_eq!(config.checkout.mode, CheckoutMode::Safe);
        assert!(config.remove.delete_working_files);
    }

    #[test]
    fn rejects_unknown_fields_with_line_number() {
        let error = RepositoryConfig::parse("[checkout]\nmode = \"force\"\nspeed = 3\n").unwrap_err();

        assert!(error.starts_with("line 3:"), "{error}");
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(RepositoryConfig::parse("[checkout]\nmode = \"gentle\"\n").is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();

        let config = RepositoryConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();

        assert_eq!(config, RepositoryConfig::default());
    }

    #[test]
    fn invalid_file_names_its_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not valid [[[toml").unwrap();

        let error = RepositoryConfig::load(&path).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::InvalidConfig { path: p, .. }) if *p == path
        ));
    }

    #[test]
    fn default_config_round_trips() {
        let config = RepositoryConfig::default();
        let text = config.to_toml_string().unwrap();

        assert!(text.contains("mode = \"force\""));
        assert_eq!(RepositoryConfig::parse(&text).unwrap(), config);
    }
}
