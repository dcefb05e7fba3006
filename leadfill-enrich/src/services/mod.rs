//! Upstream lookup services
//!
//! Each [`StrategyKind`] maps to one [`LookupStrategy`] implementation backed
//! by a shared [`UpstreamClient`].

pub mod apollo;
pub mod mls;
pub mod upstream;

pub use apollo::{ApolloMatchStrategy, ApolloSearchStrategy};
pub use mls::MlsListingStrategy;
pub use upstream::{classify_response, UpstreamClient};

use leadfill_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EnrichConfig;
use crate::resolver::LookupStrategy;

/// Configured lookup strategies, named as they appear in config and output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// RapidAPI MLS listing lookup by identifier
    MlsListing,
    /// Apollo people match by name
    ApolloMatch,
    /// Apollo keyword search by full name
    ApolloSearch,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::MlsListing => "mls_listing",
            StrategyKind::ApolloMatch => "apollo_match",
            StrategyKind::ApolloSearch => "apollo_search",
        }
    }
}

/// Connection settings for one upstream API
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub api_key: Option<String>,
    /// Overrides the built-in base URL for this upstream
    pub base_url: Option<String>,
    /// RapidAPI host header; derived from the base URL when unset
    pub host: Option<String>,
    /// Total per-request timeout; expiry counts as a transient failure
    pub timeout_secs: u64,
    /// Rate budget shared by every batch
    pub requests_per_second: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            host: None,
            timeout_secs: 20,
            requests_per_second: 1,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .field("timeout_secs", &self.timeout_secs)
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

/// Build strategies in configured priority order
///
/// Strategies whose upstream has no API key are left out with a warning;
/// repeated entries are ignored. Having no usable strategy is an error.
pub fn build_strategies(config: &EnrichConfig) -> Result<Vec<Arc<dyn LookupStrategy>>> {
    let mut apollo: Option<Arc<UpstreamClient>> = None;
    let mut mls: Option<Arc<UpstreamClient>> = None;
    let mut seen = Vec::new();
    let mut strategies: Vec<Arc<dyn LookupStrategy>> = Vec::new();

    for kind in &config.policy.strategy_order {
        if seen.contains(kind) {
            warn!(strategy = kind.as_str(), "Strategy listed twice, ignoring repeat");
            continue;
        }
        seen.push(*kind);

        let upstream = match kind {
            StrategyKind::MlsListing => {
                shared_client(&mut mls, "MLS", &config.mls, mls::MLS_BASE_URL)
            }
            StrategyKind::ApolloMatch | StrategyKind::ApolloSearch => {
                shared_client(&mut apollo, "Apollo", &config.apollo, apollo::APOLLO_BASE_URL)
            }
        };

        let Some(client) = upstream else {
            warn!(strategy = kind.as_str(), "Strategy disabled");
            continue;
        };

        let strategy: Arc<dyn LookupStrategy> = match kind {
            StrategyKind::MlsListing => Arc::new(MlsListingStrategy::new(client, &config.mls)),
            StrategyKind::ApolloMatch => Arc::new(ApolloMatchStrategy::new(client)),
            StrategyKind::ApolloSearch => Arc::new(ApolloSearchStrategy::new(client)),
        };
        strategies.push(strategy);
    }

    if strategies.is_empty() {
        return Err(Error::Config(
            "No lookup strategy is usable. Configure an API key using one of:\n\
             1. Environment: LEADFILL_APOLLO_API_KEY / LEADFILL_MLS_API_KEY\n\
             2. TOML config: [apollo] api_key = \"...\" / [mls] api_key = \"...\""
                .to_string(),
        ));
    }

    info!(
        strategies = ?strategies.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
        "Lookup strategies ready"
    );
    Ok(strategies)
}

/// Lazily build the one client for an upstream
///
/// `None` when the upstream has no key or its client cannot be built.
fn shared_client(
    slot: &mut Option<Arc<UpstreamClient>>,
    label: &'static str,
    config: &UpstreamConfig,
    default_base_url: &str,
) -> Option<Arc<UpstreamClient>> {
    if slot.is_none() {
        if config.api_key.is_none() {
            warn!(upstream = label, "API key not configured");
            return None;
        }
        match UpstreamClient::new(label, config, default_base_url) {
            Ok(client) => *slot = Some(Arc::new(client)),
            Err(e) => {
                warn!(upstream = label, error = %e, "Upstream client could not be built");
                return None;
            }
        }
    }
    slot.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_keys(apollo: Option<&str>, mls: Option<&str>) -> EnrichConfig {
        let mut config = EnrichConfig::default();
        config.apollo.api_key = apollo.map(str::to_string);
        config.mls.api_key = mls.map(str::to_string);
        config
    }

    #[test]
    fn test_all_strategies_in_order() {
        let strategies = build_strategies(&config_with_keys(Some("a"), Some("m"))).unwrap();
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["mls_listing", "apollo_match", "apollo_search"]);
    }

    #[test]
    fn test_missing_key_disables_strategy() {
        let strategies = build_strategies(&config_with_keys(Some("a"), None)).unwrap();
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["apollo_match", "apollo_search"]);
    }

    #[test]
    fn test_no_keys_is_config_error() {
        let result = build_strategies(&config_with_keys(None, None));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_custom_order_and_duplicates() {
        let mut config = config_with_keys(Some("a"), Some("m"));
        config.policy.strategy_order = vec![
            StrategyKind::ApolloSearch,
            StrategyKind::MlsListing,
            StrategyKind::ApolloSearch,
        ];
        let strategies = build_strategies(&config).unwrap();
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["apollo_search", "mls_listing"]);
    }

    #[test]
    fn test_shared_client_built_once_per_upstream() {
        let mut slot = None;
        let keyless = UpstreamConfig::default();
        assert!(shared_client(&mut slot, "Apollo", &keyless, apollo::APOLLO_BASE_URL).is_none());
        assert!(slot.is_none());

        let keyed = UpstreamConfig {
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let first = shared_client(&mut slot, "Apollo", &keyed, apollo::APOLLO_BASE_URL).unwrap();
        let second = shared_client(&mut slot, "Apollo", &keyed, apollo::APOLLO_BASE_URL).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = UpstreamConfig {
            api_key: Some("secret-key".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
