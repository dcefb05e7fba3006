//! Lookup strategy trait and its error taxonomy

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ContactFragment, ContactQuery};

/// Failure of a single strategy call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyError {
    /// Network failure, timeout or upstream rate-limit signal; retried
    #[error("Transient error: {0}")]
    Transient(String),

    /// Non-2xx response other than a rate-limit signal; not retried
    #[error("Upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// 2xx response whose body does not match any known shape; not retried
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl StrategyError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StrategyError::Transient(_))
    }
}

/// One named lookup method against one upstream API
///
/// Implementations are called strictly one at a time per row by
/// [`super::ResolutionPolicy`]; they own any per-host throttling.
#[async_trait]
pub trait LookupStrategy: Send + Sync {
    /// Strategy name, recorded in the `source` column on a match
    fn name(&self) -> &str;

    /// Whether the query carries the fields this strategy needs
    fn can_attempt(&self, query: &ContactQuery) -> bool;

    /// Perform one lookup
    ///
    /// `Ok` with an empty fragment means the upstream answered but had no
    /// contact for this query.
    async fn lookup(&self, query: &ContactQuery) -> Result<ContactFragment, StrategyError>;
}
