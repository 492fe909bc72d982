// 📚 Catalog Loader
// Walks a directory tree, parses every price list and freezes the result
// ordered by unit price

use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::LoadError;
use crate::parser::{is_price_file, CsvPriceListParser, Entry, PriceListParser};
use crate::roles::RoleSynonyms;

/// Default file-name marker selecting price lists
pub const DEFAULT_FILE_MARKER: &str = "price";

// ============================================================================
// LOADER OPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Substring (case-insensitive) a file name must contain to be loaded
    pub file_marker: String,
    pub synonyms: RoleSynonyms,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            file_marker: DEFAULT_FILE_MARKER.to_string(),
            synonyms: RoleSynonyms::default(),
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Catalog - every entry from every price list, ascending by unit price
///
/// Entries with equal unit price keep the order they were read in (file walk
/// order, then row order). There is no way to add or change entries once a
/// catalog exists.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<Entry>,
}

/// Per-source-file summary, see `Catalog::source_summary`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source_file: String,
    pub entries: usize,
    pub min_unit_price: f64,
    pub max_unit_price: f64,
}

impl Catalog {
    /// Load with the default marker and synonym sets
    pub fn load(root: &Path) -> Result<Catalog, LoadError> {
        Self::load_with_options(root, &LoaderOptions::default())
    }

    pub fn load_with_options(root: &Path, options: &LoaderOptions) -> Result<Catalog, LoadError> {
        let parser = CsvPriceListParser::new(options.synonyms.clone());
        Self::load_with(root, &options.file_marker, &parser)
    }

    /// Load every eligible file under `root` through `parser`.
    ///
    /// Fails on the first error; nothing is returned for the files that did
    /// parse.
    pub fn load_with(
        root: &Path,
        file_marker: &str,
        parser: &dyn PriceListParser,
    ) -> Result<Catalog, LoadError> {
        let mut files = 0usize;

        let per_file = PriceFiles::new(root, file_marker)?
            .map(|path| {
                let path = path?;
                files += 1;
                parser.parse(&path)
            })
            .collect::<Result<Vec<Vec<Entry>>, LoadError>>()?;

        let catalog = Catalog::from_entries(per_file.into_iter().flatten().collect());

        info!(
            root = %root.display(),
            files,
            entries = catalog.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Freeze entries (in read order) into a catalog.
    pub fn from_entries(mut entries: Vec<Entry>) -> Catalog {
        // stable: ties keep read order
        entries.sort_by(|a, b| {
            a.unit_price()
                .partial_cmp(&b.unit_price())
                .unwrap_or(Ordering::Equal)
        });
        Catalog { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry count and unit price range per source file, in the order each
    /// file first appears in the catalog.
    pub fn source_summary(&self) -> Vec<SourceSummary> {
        let mut summary: Vec<SourceSummary> = Vec::new();

        for entry in &self.entries {
            match summary.iter_mut().find(|s| s.source_file == entry.source_file()) {
                Some(stat) => {
                    stat.entries += 1;
                    stat.max_unit_price = entry.unit_price();
                }
                None => summary.push(SourceSummary {
                    source_file: entry.source_file().to_string(),
                    entries: 1,
                    min_unit_price: entry.unit_price(),
                    max_unit_price: entry.unit_price(),
                }),
            }
        }

        summary
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// DIRECTORY WALK
// ============================================================================

/// Depth-first walk yielding eligible files.
///
/// Siblings are visited in lexical order of their names so that two runs over
/// the same tree produce the same catalog. Symlinked directories are not
/// descended into.
struct PriceFiles {
    stack: Vec<std::vec::IntoIter<PathBuf>>,
    marker: String,
}

impl PriceFiles {
    fn new(root: &Path, marker: &str) -> Result<Self, LoadError> {
        Ok(PriceFiles {
            stack: vec![read_sorted(root)?.into_iter()],
            marker: marker.to_string(),
        })
    }
}

impl Iterator for PriceFiles {
    type Item = Result<PathBuf, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.stack.last_mut()?.next();
            let path = match next {
                Some(path) => path,
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            let file_type = match fs::symlink_metadata(&path) {
                Ok(meta) => meta.file_type(),
                Err(source) => return Some(Err(LoadError::Io { path, source })),
            };

            if file_type.is_dir() {
                match read_sorted(&path) {
                    Ok(children) => self.stack.push(children.into_iter()),
                    Err(err) => return Some(Err(err)),
                }
                continue;
            }

            if !is_price_file(&path, &self.marker) {
                debug!(file = %path.display(), "skipping, not a price list");
                continue;
            }

            // follows symlinks to regular files
            if path.is_file() {
                return Some(Ok(path));
            }
        }
    }
}

fn read_sorted(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_error = |source: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

// ============================================================================
// TESTS
// ============================================================================
