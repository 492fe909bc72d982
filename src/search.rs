// 🔍 Query Engine
// Case-insensitive name search over a frozen catalog + text table output

use crate::catalog::Catalog;
use crate::parser::Entry;

const HEADERS: [&str; 6] = ["№", "Наименование", "Цена", "Вес", "Файл", "Цена за кг."];

/// Entries whose name contains `text`, ignoring case, in catalog order.
pub fn search<'a>(catalog: &'a Catalog, text: &str) -> Vec<&'a Entry> {
    let needle = text.to_lowercase();

    catalog
        .iter()
        .filter(|entry| entry.name().to_lowercase().contains(&needle))
        .collect()
}

/// SearchResults - one query and what it matched
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    pub query: String,
    pub matches: Vec<&'a Entry>,
}

impl<'a> SearchResults<'a> {
    pub fn run(catalog: &'a Catalog, query: &str) -> Self {
        SearchResults {
            query: query.to_string(),
            matches: search(catalog, query),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Message shown instead of a table when nothing matched
    pub fn not_found_message(&self) -> String {
        format!("Ничего не найдено по запросу \"{}\".", self.query)
    }

    /// Table of the matches, or the not-found message.
    pub fn render(&self) -> String {
        if self.is_empty() {
            self.not_found_message()
        } else {
            render_table(&self.matches)
        }
    }
}

/// Text table with a header line, one line per entry and a closing rule.
///
/// Column widths come from the rows being printed, so two calls never affect
/// each other's layout.
pub fn render_table(entries: &[&Entry]) -> String {
    let rows: Vec<[String; 6]> = entries
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            [
                (idx + 1).to_string(),
                e.name().to_string(),
                e.price().to_string(),
                e.weight().to_string(),
                e.source_file().to_string(),
                format!("{:.2}", e.unit_price()),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let [w_pos, w_name, w_price, w_weight, w_file, w_unit] = widths;

    out.push_str(&format!(
        "{:>w_pos$} {:^w_name$} {:>w_price$} {:>w_weight$} {:^w_file$} {:>w_unit$}\n",
        HEADERS[0], HEADERS[1], HEADERS[2], HEADERS[3], HEADERS[4], HEADERS[5],
    ));

    for [pos, name, price, weight, file, unit] in &rows {
        out.push_str(&format!(
            "{pos:>w_pos$} {name:<w_name$} {price:>w_price$} {weight:>w_weight$} {file:<w_file$} {unit:>w_unit$}\n",
        ));
    }

    let total: usize = widths.iter().sum::<usize>() + widths.len() - 1;
    out.push_str(&"-".repeat(total));
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, price: i64, weight: i64) -> Entry {
        Entry::new(name.to_string(), price, weight, "price.csv".to_string(), 2).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            entry("Молоко 1л", 90, 1),
            entry("Хлеб", 50, 1),
            entry("молоко топлёное", 120, 2),
            entry("Сгущённое МОЛОКО", 200, 1),
        ])
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = Catalog::from_entries(vec![entry("Молоко 1л", 90, 1), entry("Хлеб", 50, 1)]);

        let found = search(&catalog, "молоко");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "Молоко 1л");

        let found = search(&catalog, "МОЛОКО");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_search_keeps_catalog_order() {
        let catalog = catalog();
        let found: Vec<&str> = search(&catalog, "молоко").iter().map(|e| e.name()).collect();

        assert_eq!(found, vec!["молоко топлёное", "Молоко 1л", "Сгущённое МОЛОКО"]);
    }

    #[test]
    fn test_search_no_match_is_empty() {
        let catalog = catalog();

        assert!(search(&catalog, "сыр").is_empty());
        assert!(SearchResults::run(&catalog, "сыр").is_empty());
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let catalog = catalog();
        assert_eq!(search(&catalog, "").len(), catalog.len());
    }

    #[test]
    fn test_render_not_found_message() {
        let catalog = catalog();
        let results = SearchResults::run(&catalog, "сыр");

        assert_eq!(results.render(), "Ничего не найдено по запросу \"сыр\".");
    }

    #[test]
    fn test_render_table_lines() {
        let catalog = catalog();
        let results = SearchResults::run(&catalog, "хлеб");
        let table = results.render();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Наименование"));
        assert!(lines[0].contains("Цена за кг."));
        assert!(lines[1].starts_with("1 Хлеб"));
        assert!(lines[1].ends_with("50.00"));
        assert!(lines[2].chars().all(|c| c == '-'));
    }

    #[test]
    fn test_render_widths_follow_current_results() {
        let catalog = catalog();

        let wide = SearchResults::run(&catalog, "сгущ").render();
        let narrow = SearchResults::run(&catalog, "хлеб").render();

        let width = |s: &str| s.lines().next().unwrap().chars().count();
        assert!(width(&wide) > width(&narrow));
        // the narrow table is the same no matter what was searched before
        assert_eq!(narrow, SearchResults::run(&catalog, "хлеб").render());
    }

    #[test]
    fn test_render_rows_are_aligned() {
        let catalog = catalog();
        let table = SearchResults::run(&catalog, "о").render();
        let widths: Vec<usize> = table.lines().map(|l| l.chars().count()).collect();

        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}
