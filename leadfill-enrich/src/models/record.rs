//! Row-level records: uploaded input, derived query, enriched output

use std::sync::Arc;

use super::LookupResult;

/// One uploaded CSV row
///
/// Values line up with `headers`; every record built through
/// [`InputRecord::from_fields`] has exactly one value per header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl InputRecord {
    /// Build a record, padding short rows with blanks and truncating long ones
    pub fn from_fields<I, S>(headers: Arc<[String]>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let width = headers.len();
        let mut values: Vec<String> = fields.into_iter().take(width).map(Into::into).collect();
        values.resize(width, String::new());
        Self { headers, values }
    }

    /// Value of the first column named `column`, if the column exists
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .map(|i| self.values[i].as_str())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Canonical lookup key derived from one [`InputRecord`]
///
/// Every present field is trimmed and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactQuery {
    /// Listing / MLS identifier
    pub identifier: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Full name (from its own column or synthesized from first + last)
    pub full_name: Option<String>,
}

impl ContactQuery {
    /// False when every field is blank; such rows are never looked up
    pub fn is_resolvable(&self) -> bool {
        self.identifier.is_some()
            || self.first_name.is_some()
            || self.last_name.is_some()
            || self.full_name.is_some()
    }
}

/// Input row plus its lookup outcome
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: InputRecord,
    pub result: LookupResult,
}
