//! Record normalizer
//!
//! Extracts the canonical lookup key from one uploaded row. Only whitespace
//! is trimmed; case, punctuation and unicode are passed through untouched so
//! upstream APIs see what the user uploaded.

use serde::Deserialize;

use crate::models::{ContactQuery, InputRecord};

/// Names of the input columns the normalizer reads
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnMapping {
    /// Listing / MLS identifier column
    pub identifier: String,
    pub first_name: String,
    pub last_name: String,
    /// Optional full-name column; synthesized from first + last when absent or blank
    pub full_name: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            identifier: "MLS Number".to_string(),
            first_name: "First Name".to_string(),
            last_name: "Last Name".to_string(),
            full_name: Some("Full Name".to_string()),
        }
    }
}

/// Derive a [`ContactQuery`] from one input row
pub fn normalize(record: &InputRecord, mapping: &ColumnMapping) -> ContactQuery {
    let field = |column: &str| {
        record
            .get(column)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let identifier = field(&mapping.identifier);
    let first_name = field(&mapping.first_name);
    let last_name = field(&mapping.last_name);

    let full_name = mapping
        .full_name
        .as_deref()
        .and_then(field)
        .or_else(|| synthesize_full_name(first_name.as_deref(), last_name.as_deref()));

    ContactQuery {
        identifier,
        first_name,
        last_name,
        full_name,
    }
}

fn synthesize_full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = format!("{} {}", first.unwrap_or(""), last.unwrap_or(""));
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
