//! Naming configuration.
//!
//! Loaded once at startup from a YAML file and never mutated afterwards:
//!
//! ```yaml
//! container_link_prefixes: ["eth"]
//! remove_duplicated_symbols: true
//! replacements:
//!   - admin: adm
//!   - a: ""
//! link_index_separator: "-"
//! ```
//!
//! Every key is optional. Unknown keys are rejected.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/docker-veth-namer.yml";

/// One substitution rule applied to container names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Text to look for.
    pub needle: String,
    /// Text put in its place. May be empty.
    pub replacement: String,
}

impl Replacement {
    pub fn new(needle: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            replacement: replacement.into(),
        }
    }
}

/// Process-wide naming configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Prefixes stripped from in-container link names; first match wins.
    pub container_link_prefixes: Vec<String>,
    /// Collapse runs of identical adjacent characters in the morphed name.
    pub remove_duplicated_symbols: bool,
    /// Ordered substitution rules.
    pub replacements: Vec<Replacement>,
    /// Separator placed in front of the link suffix.
    pub link_index_separator: String,
}

/// On-disk shape of the configuration file.
///
/// Every key may be absent or null; both mean the zero value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    container_link_prefixes: Option<Vec<String>>,
    remove_duplicated_symbols: Option<bool>,
    replacements: Option<Vec<Option<BTreeMap<String, Option<String>>>>>,
    link_index_separator: Option<String>,
}

impl Config {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the configuration from a YAML file.
    ///
    /// An empty path yields the default configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_yaml_str(&text)
    }

    /// Parse the configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: ConfigFile = serde_yaml::from_str(text)?;
        Self::from_file(file)
    }

    /// Add a link prefix rule.
    pub fn link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.container_link_prefixes.push(prefix.into());
        self
    }

    /// Enable or disable duplicate collapsing.
    pub fn remove_duplicated_symbols(mut self, enabled: bool) -> Self {
        self.remove_duplicated_symbols = enabled;
        self
    }

    /// Set the link index separator.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.link_index_separator = separator.into();
        self
    }
}

impl Config {
    fn from_file(file: ConfigFile) -> Result<Self> {
        let entries = file.replacements.unwrap_or_default();
        let mut replacements = Vec::with_capacity(entries.len());

        for (i, entry) in entries.into_iter().enumerate() {
            let entry = entry.unwrap_or_default();
            if entry.len() > 1 {
                return Err(Error::Config(format!(
                    "replacements[{}] has {} keys, expected a single `needle: replacement` pair",
                    i,
                    entry.len()
                )));
            }
            // Empty entries are skipped.
            if let Some((needle, replacement)) = entry.into_iter().next() {
                replacements.push(Replacement {
                    needle,
                    replacement: replacement.unwrap_or_default(),
                });
            }
        }

        Ok(Self {
            container_link_prefixes: file.container_link_prefixes.unwrap_or_default(),
            remove_duplicated_symbols: file.remove_duplicated_symbols.unwrap_or_default(),
            replacements,
            link_index_separator: file.link_index_separator.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = Config::from_yaml_str(
            r#"
container_link_prefixes: ["eth", "en"]
remove_duplicated_symbols: true
replacements:
  - admin: adm
  - a: ""
  - {}
  - o: ""
link_index_separator: "-"
"#,
        )
        .unwrap();

        assert_eq!(config.container_link_prefixes, vec!["eth", "en"]);
        assert!(config.remove_duplicated_symbols);
        assert_eq!(
            config.replacements,
            vec![
                Replacement::new("admin", "adm"),
                Replacement::new("a", ""),
                Replacement::new("o", ""),
            ]
        );
        assert_eq!(config.link_index_separator, "-");
    }

    #[test]
    fn test_missing_keys_default() {
        let config = Config::from_yaml_str("link_index_separator: _\n").unwrap();
        assert_eq!(config, Config::new().separator("_"));
    }

    #[test]
    fn test_null_values_default() {
        let config = Config::from_yaml_str(
            r#"
container_link_prefixes:
remove_duplicated_symbols:
link_index_separator:
replacements:
  - admin:
  -
  - o: "0"
"#,
        )
        .unwrap();

        assert_eq!(config.link_index_separator, "");
        assert!(config.container_link_prefixes.is_empty());
        assert!(!config.remove_duplicated_symbols);
        assert_eq!(
            config.replacements,
            vec![Replacement::new("admin", ""), Replacement::new("o", "0")]
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_yaml_str("link_prefixes: [eth]\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_multi_key_replacement_rejected() {
        let err = Config::from_yaml_str("replacements:\n  - {a: b, c: d}\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_path_is_default() {
        assert_eq!(Config::load("").unwrap(), Config::default());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/docker-veth-namer.yml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
