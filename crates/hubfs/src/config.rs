//! Adapter settings.
//!
//! Read from `$XDG_CONFIG_HOME/hubfs/config.toml`:
//!
//! ```toml
//! ask_commit_message = true
//! default_encoding = "utf-8"
//! allow_move = true
//! token_env = "GITHUB_TOKEN"
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Prompt for a commit message on every repository mutation.
    pub ask_commit_message: bool,
    /// Charset used by `read_text`; `utf-8` when unset.
    pub default_encoding: Option<String>,
    /// Offer move and rename on repositories.
    pub allow_move: bool,
    /// Environment variable holding the access token.
    pub token_env: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ask_commit_message: true,
            default_encoding: None,
            allow_move: true,
            token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

impl Settings {
    /// Load from the default location, or defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn text_encoding(&self) -> &str {
        self.default_encoding.as_deref().unwrap_or("utf-8")
    }
}

/// `$XDG_CONFIG_HOME/hubfs/config.toml`, falling back to `~/.config`.
pub fn default_path() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp"))
                .join(".config")
        })
        .join("hubfs")
        .join("config.toml")
}
