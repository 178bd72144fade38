//! PMOShare configuration.
//!
//! Loads the shared-folder list and the GetProtocolInfo source string
//! from a YAML file. The file path comes from the `PMOSHARE_CONFIG`
//! environment variable; without it the embedded default configuration
//! (no shared folders) is used.

use anyhow::{Context, Result};
use pmovfs::SharedRoot;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{env, fs};
use tracing::info;

/// Environment variable holding the configuration file path.
pub const ENV_CONFIG_PATH: &str = "PMOSHARE_CONFIG";

// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("pmoshare.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Shared directory trees, in object-id index order.
    #[serde(default)]
    pub folders: Vec<SharedRoot>,

    /// `Source` string returned by GetProtocolInfo.
    #[serde(default = "default_protocol_info")]
    pub protocol_info: String,
}

fn default_protocol_info() -> String {
    "http-get:*:audio/mpeg:*,http-get:*:video/mp4:*".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            protocol_info: default_protocol_info(),
        }
    }
}

impl Config {
    /// Loads the configuration from `PMOSHARE_CONFIG`, falling back to
    /// the embedded default document.
    pub fn load() -> Result<Self> {
        match env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => Self::from_yaml(DEFAULT_CONFIG),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        let config = Self::from_yaml(&text)?;
        info!(
            path = %path.display(),
            folders = config.folders.len(),
            "PMOShare configuration loaded"
        );
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing PMOShare configuration")
    }
}
