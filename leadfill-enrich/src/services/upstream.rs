//! Shared HTTP plumbing for upstream lookup APIs
//!
//! One [`UpstreamClient`] exists per upstream host for the life of the
//! service. Its rate limiter is therefore global to every batch: the
//! upstream limit applies per API key, not per request or per upload.

use governor::{Quota, RateLimiter};
use leadfill_common::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;

use super::UpstreamConfig;
use crate::resolver::StrategyError;

/// Connection establishment bound, separate from the total request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest upstream error body kept in logs
const MAX_ERROR_BODY_CHARS: usize = 300;

type DirectRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// HTTP client, credentials and rate budget for one upstream API
pub struct UpstreamClient {
    label: &'static str,
    http_client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: DirectRateLimiter,
}

impl UpstreamClient {
    /// Build a client; fails when no API key is configured
    pub fn new(label: &'static str, config: &UpstreamConfig, default_base_url: &str) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config(format!("{} API key not configured", label)))?;

        let http_client = Client::builder()
            .user_agent(leadfill_common::config::get_user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build {} HTTP client: {}", label, e)))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(default_base_url)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            label,
            http_client,
            base_url,
            api_key,
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn http(&self) -> &Client {
        &self.http_client
    }

    /// Absolute URL for `path` on this upstream
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Wait for a rate-limit permit, send, and classify the response
    pub async fn execute(&self, request: RequestBuilder) -> std::result::Result<Value, StrategyError> {
        self.rate_limiter.until_ready().await;

        let response = request.send().await.map_err(|e| {
            StrategyError::Transient(format!("{} request failed: {}", self.label, e))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            StrategyError::Transient(format!("{} response read failed: {}", self.label, e))
        })?;

        tracing::debug!(upstream = self.label, status, "Upstream responded");
        classify_response(status, &body)
    }
}

/// Map an upstream status and body onto the strategy error taxonomy
///
/// - 429 → transient (rate-limit signal)
/// - other non-2xx → upstream error
/// - 2xx that is not JSON → malformed response
pub fn classify_response(status: u16, body: &str) -> std::result::Result<Value, StrategyError> {
    if status == 429 {
        return Err(StrategyError::Transient("rate limited (HTTP 429)".to_string()));
    }

    if !(200..300).contains(&status) {
        return Err(StrategyError::Upstream {
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    serde_json::from_str(body)
        .map_err(|e| StrategyError::MalformedResponse(format!("invalid JSON body: {}", e)))
}
