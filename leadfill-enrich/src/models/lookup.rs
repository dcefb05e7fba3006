//! Lookup outcome types

use serde::{Deserialize, Serialize};

/// Contact fields returned by one strategy call, already trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFragment {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactFragment {
    /// Build a fragment, dropping blank values
    pub fn new(email: Option<String>, phone: Option<String>) -> Self {
        Self {
            email: non_blank(email),
            phone: non_blank(phone),
        }
    }

    /// A fragment counts as a match when it carries an email or a phone
    pub fn is_match(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Per-row lookup status, written verbatim to the status column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    /// A strategy produced an email or phone
    Ok,
    /// At least one strategy ran, none produced a contact
    NoMatch,
    /// No strategy could run (no usable query fields)
    Skipped,
    /// The row itself could not be read
    Error,
}

impl LookupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStatus::Ok => "ok",
            LookupStatus::NoMatch => "no_match",
            LookupStatus::Skipped => "skipped",
            LookupStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for LookupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Name of the strategy that produced the contact
    pub source: Option<String>,
    pub status: LookupStatus,
}

impl LookupResult {
    pub fn ok(source: impl Into<String>, fragment: ContactFragment) -> Self {
        Self {
            email: fragment.email,
            phone: fragment.phone,
            source: Some(source.into()),
            status: LookupStatus::Ok,
        }
    }

    pub fn no_match() -> Self {
        Self::empty(LookupStatus::NoMatch)
    }

    pub fn skipped() -> Self {
        Self::empty(LookupStatus::Skipped)
    }

    pub fn error() -> Self {
        Self::empty(LookupStatus::Error)
    }

    fn empty(status: LookupStatus) -> Self {
        Self {
            email: None,
            phone: None,
            source: None,
            status,
        }
    }
}
