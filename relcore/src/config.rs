use std::path::{Path, PathBuf};

use relterm::printer::DEFAULT_WIDTH;
use serde::Deserialize;

use crate::error::{LowerError, LowerResult};

/// Environment variable overriding the location of the configuration file.
pub const ENV_CONFIG_PATH: &str = "RELCORE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Layout width of the serialized script.
    pub width: usize,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Reset the name allocator before each translation.
    pub reset_names: bool,
    /// Emit the assertions constraining field columns to their declared signatures.
    pub field_typing: bool,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            reset_names: true,
            field_typing: true,
        }
    }
}

/// Translator settings, usually read from a TOML file:
///
/// ```toml
/// [printer]
/// width = 100
///
/// [lowering]
/// reset_names = true
/// field_typing = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub printer: PrinterConfig,
    pub lowering: LoweringConfig,
}

impl TranslatorConfig {
    /// Path named by [`ENV_CONFIG_PATH`], if set.
    pub fn env_path() -> Option<PathBuf> {
        std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from)
    }

    pub fn from_toml_str(text: &str) -> LowerResult<Self> {
        toml::from_str(text).map_err(|e| LowerError::Config {
            source: e,
            file: "<inline>".to_string(),
        })
    }

    pub fn from_file(path: &Path) -> LowerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| LowerError::Config {
            source: e,
            file: path.display().to_string(),
        })
    }

    /// Loads the file named by [`ENV_CONFIG_PATH`], or the defaults when it is unset.
    pub fn load() -> LowerResult<Self> {
        match Self::env_path() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }
}
