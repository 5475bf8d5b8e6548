//! Configuration for the snipcheck binary.
//!
//! Loaded from `$XDG_CONFIG_HOME/snipcheck/config.toml` unless `--config`
//! names another file. A missing default file means defaults; a missing
//! explicit file is an error.
//!
//! ```toml
//! color = true
//!
//! [validator]
//! additional_modules = ["geo"]
//! attach_spans = true
//!
//! [[modules]]
//! id = "geo"
//! namespaces = ["geo"]
//! types = [
//!     { name = "geo.Shape", bases = ["core.Object"] },
//!     { name = "geo.Square", bases = ["geo.Shape"] },
//! ]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snipcheck_calc::ModuleCatalog;
use snipcheck_kernel::ValidatorConfig;
use snipcheck_types::ModuleMetadata;
use thiserror::Error;

use crate::paths;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Everything the binary reads from its config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Colorize terminal output.
    pub color: bool,
    /// Keep REPL history between sessions.
    pub history: bool,
    pub validator: ValidatorConfig,
    /// Module definitions added to the engine catalog next to `core`.
    pub modules: Vec<ModuleMetadata>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            color: true,
            history: true,
            validator: ValidatorConfig::default().with_spans(true),
            modules: Vec::new(),
        }
    }
}

impl ReplConfig {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = paths::config_file();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            modules = config.modules.len(),
            "config loaded"
        );
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Plain output, no history; what tests and pipes want.
    pub fn quiet() -> Self {
        Self {
            color: false,
            history: false,
            ..Self::default()
        }
    }

    pub fn with_module(mut self, metadata: ModuleMetadata) -> Self {
        self.modules.push(metadata);
        self
    }

    /// The engine catalog: `core` plus the configured modules.
    pub fn catalog(&self) -> ModuleCatalog {
        self.modules
            .iter()
            .cloned()
            .fold(ModuleCatalog::new(), ModuleCatalog::with_module)
    }
}
