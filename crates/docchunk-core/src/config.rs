//! Documentation build configuration (`docchunk.toml`).
//!
//! ```toml
//! [docs]
//! format = "text/markdown"
//! emit-chunk = true
//! form = "BEAM"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::artifact::ChunkId;
use crate::chunk::DEFAULT_FORMAT;
use crate::pipeline::CompileOptions;

/// Name of the configuration file looked up next to the inputs.
pub const CONFIG_FILE: &str = "docchunk.toml";

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// The complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocConfig {
    /// Documentation chunk settings.
    #[serde(default)]
    pub docs: DocsSection,
}

/// The `[docs]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DocsSection {
    /// Format id used when a module does not declare one.
    #[serde(default = "default_format")]
    pub format: String,

    /// Whether compilation appends a documentation chunk at all.
    #[serde(default = "default_emit_chunk")]
    pub emit_chunk: bool,

    /// Form type written into newly created artifacts.
    #[serde(default = "default_form")]
    pub form: String,
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_emit_chunk() -> bool {
    true
}

fn default_form() -> String {
    "BEAM".to_string()
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            format: default_format(),
            emit_chunk: default_emit_chunk(),
            form: default_form(),
        }
    }
}

impl DocConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: DocConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load `docchunk.toml` from a directory, or the defaults if it is absent.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.docs.format.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "docs.format",
                reason: "must not be empty".to_string(),
            });
        }
        if ChunkId::from_name(&self.docs.form).is_none() {
            return Err(ConfigError::Invalid {
                field: "docs.form",
                reason: format!("'{}' is not a four character ASCII name", self.docs.form),
            });
        }
        Ok(())
    }

    /// Form type for new artifacts.
    pub fn form(&self) -> ChunkId {
        // validate() has checked the name; fall back for hand-built configs.
        ChunkId::from_name(&self.docs.form).unwrap_or(ChunkId(*b"BEAM"))
    }

    /// Options handed to each compilation unit.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            default_format: self.docs.format.clone(),
            skip_chunk: !self.docs.emit_chunk,
        }
    }
}
