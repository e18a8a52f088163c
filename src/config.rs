use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Name of the optional config file looked up in the working tree root.
pub const CONFIG_FILE_NAME: &str = ".iid-check.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .iid-check.toml.
///
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Which files count as interface definitions
    #[serde(default)]
    pub idl: IdlConfig,

    /// Descriptors declared by the config file, added to the built-in table
    #[serde(default)]
    pub descriptors: Vec<DescriptorConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdlConfig {
    /// File extensions to check, with or without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for IdlConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["idl".to_string()]
}

/// A member descriptor such as `[notxpcom]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DescriptorConfig {
    /// Token as written between the brackets
    pub token: String,
    /// Whether adding or removing the descriptor changes the binary layout.
    /// Defaults to true so that unlisted behaviour never hides a change.
    #[serde(default = "default_affects_binary_compat")]
    pub affects_binary_compat: bool,
}

fn default_affects_binary_compat() -> bool {
    true
}

/// Descriptors known without any configuration.
pub fn default_descriptors() -> Vec<DescriptorConfig> {
    ["notxpcom", "nostdcall"]
        .into_iter()
        .map(|token| DescriptorConfig {
            token: token.to_string(),
            affects_binary_compat: true,
        })
        .collect()
}

impl Config {
    /// Load configuration from .iid-check.toml in the working tree root.
    /// Returns default config if the file doesn't exist.
    pub fn load(tree_root: &Path) -> Result<Config, ConfigError> {
        let path = tree_root.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Extensions lowercased and without leading dots, as the tokenizer
    /// compares them.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.idl
            .extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Built-in descriptors followed by configured ones. A configured token
    /// overrides the built-in entry of the same name.
    pub fn descriptor_table(&self) -> Vec<DescriptorConfig> {
        let mut table: Vec<DescriptorConfig> = default_descriptors()
            .into_iter()
            .filter(|builtin| !self.descriptors.iter().any(|d| d.token == builtin.token))
            .collect();
        table.extend(self.descriptors.iter().cloned());
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.normalized_extensions(), vec!["idl"]);
        assert!(config.descriptors.is_empty());
        assert_eq!(config.descriptor_table(), default_descriptors());
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[idl]
extensions = [".IDL", "xpidl"]

[[descriptors]]
token = "noscript"
affects_binary_compat = false

[[descriptors]]
token = "implicit_jscontext"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.normalized_extensions(), vec!["idl", "xpidl"]);
        assert_eq!(config.descriptors.len(), 2);
        assert!(!config.descriptors[0].affects_binary_compat);
        assert!(config.descriptors[1].affects_binary_compat);
    }

    #[test]
    fn test_configured_descriptor_overrides_builtin() {
        let config: Config = toml::from_str(
            "[[descriptors]]\ntoken = \"notxpcom\"\naffects_binary_compat = false\n",
        )
        .unwrap();
        let table = config.descriptor_table();
        let notxpcom: Vec<&DescriptorConfig> =
            table.iter().filter(|d| d.token == "notxpcom").collect();
        assert_eq!(notxpcom.len(), 1);
        assert!(!notxpcom[0].affects_binary_compat);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.normalized_extensions(), vec!["idl"]);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.normalized_extensions(), vec!["idl"]);
    }

    #[test]
    fn test_load_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[idl\nextensions = 3").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
