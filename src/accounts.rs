//! Account classification
//!
//! Maps raw account labels to canonical categories via an alias table.
//! Deterministic: exact-match plus the `opex:` prefix rule covers every
//! chart of accounts seen so far; no fuzzy matching.

use crate::models::CanonicalAccount;
use std::collections::HashMap;

/// Alias table: canonical category → accepted raw spellings.
///
/// Passed explicitly into classification so that per-company charts of
/// accounts can coexist; this is configuration, not hidden module state.
#[derive(Debug, Clone)]
pub struct AliasTable {
    exact: HashMap<String, CanonicalAccount>,
}

impl AliasTable {
    /// Build a table from (canonical, accepted spellings) pairs. The
    /// canonical label itself is always accepted, so classification is
    /// idempotent.
    pub fn new(entries: &[(CanonicalAccount, &[&str])]) -> Self {
        let mut exact = HashMap::new();
        for (canonical, spellings) in entries {
            exact.insert(normalize(&canonical.to_string()), canonical.clone());
            for spelling in *spellings {
                exact.insert(normalize(spelling), canonical.clone());
            }
        }
        Self { exact }
    }

    /// Classify a raw account label.
    ///
    /// Matching policy, in order:
    /// 1. exact alias match (case-insensitive, whitespace-trimmed)
    /// 2. `opex:` prefix: any unlisted `Opex:<sub>` spelling becomes its
    ///    own subcategory, name preserved
    /// 3. `Unclassified`, excluded from aggregates and reported upstream
    pub fn classify(&self, raw: &str) -> CanonicalAccount {
        if let Some(canonical) = self.exact.get(&normalize(raw)) {
            return canonical.clone();
        }

        let trimmed = raw.trim();
        if trimmed.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("opex:")) {
            let sub = trimmed[5..].trim();
            if !sub.is_empty() {
                return CanonicalAccount::Opex(sub.to_string());
            }
        }

        CanonicalAccount::Unclassified
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new(&[
            (CanonicalAccount::Revenue, &["revenue", "total revenue"]),
            (CanonicalAccount::Cogs, &["cogs", "cost of goods sold"]),
        ])
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
