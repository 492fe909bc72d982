// ⚠️ Error types for the ingestion pipeline and the report sink

use std::path::PathBuf;
use thiserror::Error;

use crate::roles::Role;

/// Everything that can abort `Catalog::load`.
///
/// Every variant is fatal: the loader never returns a partial catalog.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Header row did not resolve one or more roles
    #[error("{file}: no column for {}", join_roles(.missing))]
    Configuration { file: String, missing: Vec<Role> },

    /// Price or weight cell is not an integer
    #[error("{file}:{line}: column {column} is not an integer: {value:?}")]
    Parse {
        file: String,
        line: u64,
        column: usize,
        value: String,
    },

    #[error("{file}:{line}: weight is zero")]
    Division { file: String, line: u64 },

    /// Row is shorter than one of the resolved column indices
    #[error("{file}:{line}: row has no column {index}")]
    MalformedRow { file: String, line: u64, index: usize },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed price list {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Writing a rendered report failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write report to {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration file exists but cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(", ")
}
