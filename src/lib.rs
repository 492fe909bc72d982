// Price Aggregator - Core Library
// Loads supplier price lists into one catalog ordered by price per kilogram

pub mod roles;
pub mod parser;
pub mod catalog;
pub mod search;
pub mod report;
pub mod config;
pub mod shell;
pub mod error;

// Only compile the terminal browser when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use roles::{resolve, ColumnRoles, ResolvedRoles, Role, RoleSynonyms};
pub use parser::{is_price_file, normalize, CsvPriceListParser, Entry, PriceListParser};
pub use catalog::{Catalog, LoaderOptions, SourceSummary, DEFAULT_FILE_MARKER};
pub use search::{render_table, search, SearchResults};
pub use report::{render_html, ReportExporter, DEFAULT_OUTPUT};
pub use config::{load_config, AppConfig, CONFIG_FILE};
pub use shell::{Command, Shell};
pub use error::{ConfigError, ExportError, LoadError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load the catalog under `root` with the default marker and synonym sets
pub fn load(root: &std::path::Path) -> Result<Catalog, LoadError> {
    Catalog::load(root)
}
