// 🏗️ Price List Parser
// Row normalization (name/price/weight → Entry) and the per-file CSV parse step

use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::LoadError;
use crate::roles::{resolve, ResolvedRoles, RoleSynonyms};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Entry - one product row from one price list, with its derived unit price
///
/// Built once by `normalize` and never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    name: String,
    price: i64,
    weight: i64,
    source_file: String,
    line_number: u64,
    unit_price: f64,
}

impl Entry {
    pub fn new(name: String, price: i64, weight: i64, source_file: String, line_number: u64) -> Option<Self> {
        if weight == 0 {
            return None;
        }

        Some(Entry {
            name,
            price,
            weight,
            source_file,
            line_number,
            unit_price: round2(price as f64 / weight as f64),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    /// Weight in kilograms
    pub fn weight(&self) -> i64 {
        self.weight
    }

    /// File name (not the full path) the row came from
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Physical line in the source file; the header is line 1
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Price per kilogram, rounded to two decimals
    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }
}

/// Round to two decimals, half to even, deciding ties on the exact binary value.
///
/// 1.115 is stored just below the half and rounds to 1.11; 0.625 is an exact
/// half and rounds to 0.62.
fn round2(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }

    let bits = value.abs().to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };

    // value == mantissa * 2^exponent; with exponent >= 0 it is already whole
    if exponent >= 0 {
        return value;
    }

    let shift = (-exponent) as u32;
    // mantissa * 100 < 2^60, so beyond this shift the scaled value is below 0.5
    let cents = if shift >= 62 {
        0
    } else {
        let scaled = mantissa as u128 * 100;
        let whole = scaled >> shift;
        let twice_rest = (scaled & ((1u128 << shift) - 1)) << 1;
        let unit = 1u128 << shift;
        if twice_rest > unit || (twice_rest == unit && whole & 1 == 1) {
            whole + 1
        } else {
            whole
        }
    };

    (cents as f64 / 100.0).copysign(value)
}

// ============================================================================
// ROW NORMALIZER
// ============================================================================

/// Turn one data row into an Entry using the file's resolved roles.
///
/// Price and weight must be integers; surrounding whitespace is ignored. Zero
/// weight is rejected; any other sign or magnitude is accepted as is.
pub fn normalize(
    row: &StringRecord,
    roles: &ResolvedRoles,
    source_file: &str,
    line_number: u64,
) -> Result<Entry, LoadError> {
    let cell = move |index: usize| {
        row.get(index).ok_or_else(|| LoadError::MalformedRow {
            file: source_file.to_string(),
            line: line_number,
            index,
        })
    };

    let int_cell = move |index: usize| -> Result<i64, LoadError> {
        let raw = cell(index)?;
        raw.trim().parse::<i64>().map_err(|_| LoadError::Parse {
            file: source_file.to_string(),
            line: line_number,
            column: index + 1,
            value: raw.to_string(),
        })
    };

    let name = cell(roles.name)?.to_string();
    let price = int_cell(roles.price)?;
    let weight = int_cell(roles.weight)?;

    Entry::new(name, price, weight, source_file.to_string(), line_number).ok_or_else(|| {
        LoadError::Division {
            file: source_file.to_string(),
            line: line_number,
        }
    })
}

// ============================================================================
// FILE PARSERS
// ============================================================================

/// PriceListParser - turns one eligible file into its entries (file order)
pub trait PriceListParser {
    fn parse(&self, file_path: &Path) -> Result<Vec<Entry>, LoadError>;
}

/// Comma-separated UTF-8 price lists with a header row
#[derive(Debug, Clone, Default)]
pub struct CsvPriceListParser {
    synonyms: RoleSynonyms,
}

impl CsvPriceListParser {
    pub fn new(synonyms: RoleSynonyms) -> Self {
        CsvPriceListParser { synonyms }
    }
}

impl PriceListParser for CsvPriceListParser {
    fn parse(&self, file_path: &Path) -> Result<Vec<Entry>, LoadError> {
        let file = File::open(file_path).map_err(|source| LoadError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;

        let csv_error = |source: csv::Error| LoadError::Csv {
            path: file_path.to_path_buf(),
            source,
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .from_reader(file);

        let filename = file_name(file_path);

        let header = reader.headers().map_err(csv_error)?;
        let roles = resolve(header.iter(), &self.synonyms).validate(&filename)?;

        let mut entries = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(csv_error)?;
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(idx as u64 + 2);

            entries.push(normalize(&record, &roles, &filename, line)?);
        }

        debug!(file = %file_path.display(), rows = entries.len(), "parsed price list");
        Ok(entries)
    }
}

/// Whether a file takes part in loading: its name, lowercased, contains `marker`.
pub fn is_price_file(file_path: &Path, marker: &str) -> bool {
    file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase().contains(&marker.to_lowercase()))
        .unwrap_or(false)
}

fn file_name(file_path: &Path) -> String {
    file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.display().to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ROLES: ResolvedRoles = ResolvedRoles { name: 0, price: 1, weight: 2 };

    fn row(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn test_normalize_computes_unit_price() {
        let entry = normalize(&row(&["Гречка", "100", "2"]), &ROLES, "price.csv", 2).unwrap();

        assert_eq!(entry.name(), "Гречка");
        assert_eq!(entry.price(), 100);
        assert_eq!(entry.weight(), 2);
        assert_eq!(entry.source_file(), "price.csv");
        assert_eq!(entry.line_number(), 2);
        assert_eq!(entry.unit_price(), 50.0);
    }

    #[test]
    fn test_normalize_rounds_to_two_decimals() {
        let entry = normalize(&row(&["Рис", "100", "3"]), &ROLES, "price.csv", 2).unwrap();
        assert_eq!(entry.unit_price(), 33.33);

        let entry = normalize(&row(&["Рис", "200", "3"]), &ROLES, "price.csv", 3).unwrap();
        assert_eq!(entry.unit_price(), 66.67);
    }

    #[test]
    fn test_normalize_rounds_halves_to_even() {
        let cases = [
            (5, 8, 0.62),
            (81, 8, 10.12),
            (1, 8, 0.12),
            (3, 8, 0.38),
            (223, 200, 1.11),
            (-5, 8, -0.62),
        ];

        for (price, weight, expected) in cases {
            let entry = normalize(
                &row(&["Мёд", &price.to_string(), &weight.to_string()]),
                &ROLES,
                "price.csv",
                2,
            )
            .unwrap();
            assert_eq!(entry.unit_price(), expected, "{price}/{weight}");
        }
    }

    #[test]
    fn test_round2_keeps_whole_and_tiny_values() {
        assert_eq!(round2(40.0), 40.0);
        assert_eq!(round2(1e-300), 0.0);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(2.675), 2.67);
    }

    #[test]
    fn test_normalize_zero_weight_is_division_error() {
        let err = normalize(&row(&["Соль", "100", "0"]), &ROLES, "price.csv", 5).unwrap_err();

        assert!(matches!(err, LoadError::Division { line: 5, .. }));
    }

    #[test]
    fn test_normalize_non_integer_is_parse_error() {
        let err = normalize(&row(&["Соль", "12.5", "1"]), &ROLES, "price.csv", 4).unwrap_err();

        match err {
            LoadError::Parse { column, value, line, .. } => {
                assert_eq!(column, 2);
                assert_eq!(value, "12.5");
                assert_eq!(line, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_trims_number_cells() {
        let entry = normalize(&row(&["Соль", " 80 ", " 1"]), &ROLES, "price.csv", 2).unwrap();
        assert_eq!(entry.price(), 80);
        assert_eq!(entry.weight(), 1);

        // the error keeps the cell as written
        let err = normalize(&row(&["Соль", "10", " 1 кг"]), &ROLES, "price.csv", 3).unwrap_err();
        match err {
            LoadError::Parse { column, value, .. } => {
                assert_eq!(column, 3);
                assert_eq!(value, " 1 кг");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = normalize(&row(&["Соль", "  ", "1"]), &ROLES, "price.csv", 4).unwrap_err();
        assert!(matches!(err, LoadError::Parse { column: 2, .. }));
    }

    #[test]
    fn test_normalize_accepts_negative_values() {
        let entry = normalize(&row(&["Скидка", "-30", "3"]), &ROLES, "price.csv", 2).unwrap();
        assert_eq!(entry.unit_price(), -10.0);
    }

    #[test]
    fn test_normalize_short_row_is_malformed() {
        let roles = ResolvedRoles { name: 0, price: 1, weight: 4 };
        let err = normalize(&row(&["Соль", "10", "1"]), &roles, "price.csv", 2).unwrap_err();

        assert!(matches!(err, LoadError::MalformedRow { index: 4, .. }));
    }

    #[test]
    fn test_is_price_file() {
        assert!(is_price_file(Path::new("dir/price_1.csv"), "price"));
        assert!(is_price_file(Path::new("PRICE-list.txt"), "price"));
        assert!(is_price_file(Path::new("supplier_Prices"), "price"));
        assert!(!is_price_file(Path::new("price/notes.csv"), "price"));
        assert!(!is_price_file(Path::new("catalog.csv"), "price"));
    }

    #[test]
    fn test_csv_parser_reads_file_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("price_milk.csv");
        fs::write(
            &path,
            "номер,наименование,фасовка,розница\n1,Молоко,1,90\n2,Кефир,2,150\n",
        )
        .unwrap();

        let entries = CsvPriceListParser::default().parse(&path).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "Молоко");
        assert_eq!(entries[0].unit_price(), 90.0);
        assert_eq!(entries[0].line_number(), 2);
        assert_eq!(entries[1].name(), "Кефир");
        assert_eq!(entries[1].unit_price(), 75.0);
        assert_eq!(entries[1].source_file(), "price_milk.csv");
    }

    #[test]
    fn test_csv_parser_accepts_spaced_numbers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("price.csv");
        fs::write(&path, "товар,цена,вес\nСахар, 80, 2\n").unwrap();

        let entries = CsvPriceListParser::default().parse(&path).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "Сахар");
        assert_eq!(entries[0].unit_price(), 40.0);
    }

    #[test]
    fn test_csv_parser_header_only_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("price_empty.csv");
        fs::write(&path, "товар,цена,вес\n").unwrap();

        let entries = CsvPriceListParser::default().parse(&path).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_csv_parser_missing_role_fails_before_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("price_bad.csv");
        fs::write(&path, "товар,цена\nСоль,abc\n").unwrap();

        let err = CsvPriceListParser::default().parse(&path).unwrap_err();
        assert!(matches!(err, LoadError::Configuration { .. }));
    }

    #[test]
    fn test_csv_parser_unequal_row_is_csv_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("price_ragged.csv");
        fs::write(&path, "товар,цена,вес\nСоль,10\n").unwrap();

        let err = CsvPriceListParser::default().parse(&path).unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }
}
