// ⚙️ Application configuration
// Optional JSON file; every field falls back to its default

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{LoaderOptions, DEFAULT_FILE_MARKER};
use crate::error::ConfigError;
use crate::report::DEFAULT_OUTPUT;
use crate::roles::RoleSynonyms;

/// Looked up in the working directory
pub const CONFIG_FILE: &str = "price-aggregator.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory scanned (recursively) for price lists
    pub root_dir: PathBuf,
    pub output_path: PathBuf,
    pub file_marker: String,
    pub synonyms: RoleSynonyms,
    /// Listen address of the HTTP server
    pub server_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            root_dir: PathBuf::from("pricelists"),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            file_marker: DEFAULT_FILE_MARKER.to_string(),
            synonyms: RoleSynonyms::default(),
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            file_marker: self.file_marker.clone(),
            synonyms: self.synonyms.clone(),
        }
    }
}

/// Read the config at `path`; a missing file means defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}
