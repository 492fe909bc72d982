// 📄 Report Exporter
// Renders the whole catalog as a static HTML table

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

use crate::catalog::Catalog;
use crate::error::ExportError;

/// Default report destination, relative to the working directory
pub const DEFAULT_OUTPUT: &str = "output.html";

const COLUMNS: [&str; 6] = ["Номер", "Название", "Цена", "Фасовка", "Файл", "Цена за кг."];

/// Render the catalog as a self-contained HTML document.
///
/// One row per entry in catalog order. Output depends only on the catalog,
/// so rendering the same catalog twice gives identical bytes.
pub fn render_html(catalog: &Catalog) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("    <meta charset=\"utf-8\">\n");
    html.push_str("    <title>Позиции продуктов</title>\n");
    html.push_str("</head>\n<body>\n    <table>\n        <tr>\n");
    for column in COLUMNS {
        push_cell(&mut html, "th", column);
    }
    html.push_str("        </tr>\n");

    for (idx, entry) in catalog.iter().enumerate() {
        html.push_str("        <tr>\n");
        push_cell(&mut html, "td", idx + 1);
        push_cell(&mut html, "td", escape(entry.name()));
        push_cell(&mut html, "td", entry.price());
        push_cell(&mut html, "td", entry.weight());
        push_cell(&mut html, "td", escape(entry.source_file()));
        push_cell(&mut html, "td", format!("{:.2}", entry.unit_price()));
        html.push_str("        </tr>\n");
    }

    html.push_str("    </table>\n</body>\n</html>\n");
    html
}

fn push_cell(html: &mut String, tag: &str, value: impl Display) {
    html.push_str(&format!("            <{tag}>{value}</{tag}>\n"));
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// ReportExporter - renders a catalog once and writes it wherever asked
pub struct ReportExporter<'a> {
    catalog: &'a Catalog,
    rendered: OnceLock<String>,
}

impl<'a> ReportExporter<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        ReportExporter {
            catalog,
            rendered: OnceLock::new(),
        }
    }

    /// The rendered document (rendered on first call)
    pub fn document(&self) -> &str {
        self.rendered.get_or_init(|| render_html(self.catalog))
    }

    /// Write the document to `path`, replacing any existing file.
    pub fn export_to(&self, path: &Path) -> Result<PathBuf, ExportError> {
        fs::write(path, self.document()).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), entries = self.catalog.len(), "report written");
        Ok(path.to_path_buf())
    }
}

// ============================================================================
// TESTS
// ============================================================================
