// 🧭 Header Resolver
// Maps a price-list header row onto the three column roles (name, price, weight)

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

// ============================================================================
// ROLES & SYNONYMS
// ============================================================================

/// Role - the meaning a column carries in a price list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Name,
    Price,
    Weight,
}

impl Role {
    /// Human-readable label for error messages
    pub fn label(&self) -> &str {
        match self {
            Role::Name => "product name",
            Role::Price => "price",
            Role::Weight => "weight",
        }
    }
}

/// Accepted header labels per role.
///
/// Labels are matched case-sensitively and exactly. The defaults are the
/// Russian labels used by the supplier price lists; a deployment can replace
/// them through `AppConfig::synonyms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleSynonyms {
    pub name: Vec<String>,
    pub price: Vec<String>,
    pub weight: Vec<String>,
}

impl Default for RoleSynonyms {
    fn default() -> Self {
        RoleSynonyms {
            name: labels(&["товар", "название", "наименование", "продукт"]),
            price: labels(&["розница", "цена"]),
            weight: labels(&["вес", "масса", "фасовка"]),
        }
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RoleSynonyms {
    /// Role for a single header cell, if any.
    ///
    /// Sets are consulted in the order name, weight, price; the first set
    /// containing the cell decides.
    pub fn role_of(&self, cell: &str) -> Option<Role> {
        if self.name.iter().any(|l| l == cell) {
            Some(Role::Name)
        } else if self.weight.iter().any(|l| l == cell) {
            Some(Role::Weight)
        } else if self.price.iter().any(|l| l == cell) {
            Some(Role::Price)
        } else {
            None
        }
    }
}

// ============================================================================
// COLUMN ROLES
// ============================================================================

/// ColumnRoles - raw outcome of resolving one header row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub name: Option<usize>,
    pub price: Option<usize>,
    pub weight: Option<usize>,
}

/// ResolvedRoles - every role has a column; safe to drive row normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRoles {
    pub name: usize,
    pub price: usize,
    pub weight: usize,
}

impl ColumnRoles {
    /// Roles with no matching header cell
    pub fn missing(&self) -> Vec<Role> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push(Role::Name);
        }
        if self.price.is_none() {
            missing.push(Role::Price);
        }
        if self.weight.is_none() {
            missing.push(Role::Weight);
        }
        missing
    }

    /// Check that every role resolved; `file` only labels the error.
    pub fn validate(&self, file: &str) -> Result<ResolvedRoles, LoadError> {
        match (self.name, self.price, self.weight) {
            (Some(name), Some(price), Some(weight)) => Ok(ResolvedRoles { name, price, weight }),
            _ => Err(LoadError::Configuration {
                file: file.to_string(),
                missing: self.missing(),
            }),
        }
    }
}

/// Resolve a header row into column roles.
///
/// Scans left to right and overwrites on every match, so when two columns
/// carry labels of the same role the later column wins. Unknown labels are
/// ignored.
pub fn resolve<'a, I>(header: I, synonyms: &RoleSynonyms) -> ColumnRoles
where
    I: IntoIterator<Item = &'a str>,
{
    let mut roles = ColumnRoles::default();

    for (idx, cell) in header.into_iter().enumerate() {
        match synonyms.role_of(cell) {
            Some(Role::Name) => roles.name = Some(idx),
            Some(Role::Weight) => roles.weight = Some(idx),
            Some(Role::Price) => roles.price = Some(idx),
            None => {}
        }
    }

    roles
}

// ============================================================================
// TESTS
// ============================================================================
