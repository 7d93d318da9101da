use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The `[quota]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    #[serde(rename = "ENABLED")]
    pub enabled: bool,
    /// Group names applied to principals without any mapping, in order.
    #[serde(rename = "DEFAULT_GROUPS")]
    pub default_groups: Vec<String>,
}

/// On-disk configuration file. Unknown tables are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub quota: QuotaConfig,
}

impl FileConfig {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quota_table() {
        let config = FileConfig::parse(
            r#"
[quota]
ENABLED = true
DEFAULT_GROUPS = ["free-tier", "fallback"]
"#,
        )
        .unwrap();
        assert!(config.quota.enabled);
        assert_eq!(config.quota.default_groups, vec!["free-tier", "fallback"]);
    }

    #[test]
    fn test_missing_table_and_keys_default() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config.quota, QuotaConfig::default());
        assert!(!config.quota.enabled);

        let config = FileConfig::parse("[quota]\nENABLED = true\n").unwrap();
        assert!(config.quota.enabled);
        assert!(config.quota.default_groups.is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        let err = FileConfig::parse("[quota\nENABLED = yes").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = FileConfig::load(&temp.path().join("absent.toml")).unwrap();
        assert!(!config.quota.enabled);
    }

    #[test]
    fn test_write_then_load() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("stowage.toml");
        let config = FileConfig {
            quota: QuotaConfig {
                enabled: true,
                default_groups: vec!["free-tier".to_string()],
            },
        };
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        let loaded = FileConfig::load(&path).unwrap();
        assert_eq!(loaded.quota, config.quota);
    }
}
