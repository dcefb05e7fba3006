//! Contact resolution policy
//!
//! For one [`ContactQuery`], tries the configured strategies in priority
//! order and returns exactly one [`LookupResult`]:
//!
//! - unresolvable query → `skipped`, no strategy is called
//! - strategy missing its required fields → not tried
//! - transient error → same strategy retried, bounded by `max_attempts`
//! - upstream / malformed error → logged, next strategy
//! - empty fragment → no match, next strategy
//! - first fragment with email or phone → `ok`, stop
//!
//! Nothing is carried between rows.

pub mod adapters;
pub mod strategy;

pub use strategy::{LookupStrategy, StrategyError};

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{ContactFragment, ContactQuery, LookupResult};
use crate::services::StrategyKind;

/// Retry and ordering settings for the resolution policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Total attempts per strategy when it keeps failing transiently
    #[serde(alias = "max_retries")]
    pub max_attempts: u32,
    /// Fixed delay between attempts of the same strategy
    pub retry_delay_ms: u64,
    /// Strategies in priority order
    pub strategy_order: Vec<StrategyKind>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
            strategy_order: vec![
                StrategyKind::MlsListing,
                StrategyKind::ApolloMatch,
                StrategyKind::ApolloSearch,
            ],
        }
    }
}

/// Outcome of running one strategy (after retries)
enum StrategyOutcome {
    Matched(ContactFragment),
    NoMatch,
    Failed,
}

/// Ordered multi-strategy contact resolution
pub struct ResolutionPolicy {
    strategies: Vec<Arc<dyn LookupStrategy>>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ResolutionPolicy {
    /// Build a policy over `strategies`, which must already be in priority order
    pub fn new(strategies: Vec<Arc<dyn LookupStrategy>>, config: &PolicyConfig) -> Self {
        Self {
            strategies,
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Strategy names in priority order
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve one row
    pub async fn resolve(&self, row_index: usize, query: &ContactQuery) -> LookupResult {
        if !query.is_resolvable() {
            debug!(row_index, outcome = "skipped", "No query fields, row not looked up");
            return LookupResult::skipped();
        }

        let mut attempted_any = false;

        for strategy in &self.strategies {
            let name = strategy.name();

            if !strategy.can_attempt(query) {
                debug!(row_index, strategy = name, outcome = "skipped", "Required fields blank");
                continue;
            }
            attempted_any = true;

            match self.run_strategy(row_index, strategy.as_ref(), query).await {
                StrategyOutcome::Matched(fragment) => {
                    info!(row_index, strategy = name, outcome = "ok", "Contact resolved");
                    return LookupResult::ok(name, fragment);
                }
                StrategyOutcome::NoMatch => {
                    debug!(row_index, strategy = name, outcome = "no_match", "No contact returned");
                }
                StrategyOutcome::Failed => {}
            }
        }

        if attempted_any {
            info!(row_index, outcome = "no_match", "No strategy produced a contact");
            LookupResult::no_match()
        } else {
            info!(row_index, outcome = "skipped", "No strategy could be attempted");
            LookupResult::skipped()
        }
    }

    /// Call one strategy, retrying transient failures
    async fn run_strategy(
        &self,
        row_index: usize,
        strategy: &dyn LookupStrategy,
        query: &ContactQuery,
    ) -> StrategyOutcome {
        let name = strategy.name();

        for attempt in 1..=self.max_attempts {
            match strategy.lookup(query).await {
                Ok(fragment) if fragment.is_match() => return StrategyOutcome::Matched(fragment),
                Ok(_) => return StrategyOutcome::NoMatch,
                Err(e) if e.is_transient() => {
                    warn!(
                        row_index,
                        strategy = name,
                        outcome = "transient_error",
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Lookup failed transiently"
                    );
                    if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(e) => {
                    warn!(
                        row_index,
                        strategy = name,
                        outcome = "error",
                        error = %e,
                        "Lookup failed, moving to next strategy"
                    );
                    return StrategyOutcome::Failed;
                }
            }
        }

        warn!(
            row_index,
            strategy = name,
            outcome = "retries_exhausted",
            "Giving up on strategy after {} attempts",
            self.max_attempts
        );
        StrategyOutcome::Failed
    }
}
