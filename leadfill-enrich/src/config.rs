//! Configuration for leadfill-enrich
//!
//! Loaded once at startup from `leadfill-enrich.toml` (see
//! [`leadfill_common::config::resolve_config_path`] for lookup order), then
//! API keys are overlaid from the environment. Every field has a built-in
//! default so the service starts without a config file.

use leadfill_common::config::{load_toml_config, resolve_api_key, resolve_config_path, LoggingConfig};
use leadfill_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::csv_io::ResultColumns;
use crate::normalizer::ColumnMapping;
use crate::resolver::PolicyConfig;
use crate::services::UpstreamConfig;

/// Config file name under the platform config directory
pub const CONFIG_FILE_NAME: &str = "leadfill-enrich.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LEADFILL_CONFIG";

pub const APOLLO_API_KEY_ENV: &str = "LEADFILL_APOLLO_API_KEY";
pub const MLS_API_KEY_ENV: &str = "LEADFILL_MLS_API_KEY";

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// HTTP bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Directory holding enriched files until they are downloaded
    pub output_dir: PathBuf,
    /// Seconds an undownloaded output is kept before it is swept
    pub output_ttl_secs: u64,
    /// Largest accepted upload body
    pub max_upload_bytes: usize,
    pub logging: LoggingConfig,
    pub columns: ColumnConfig,
    pub policy: PolicyConfig,
    /// Apollo.io people-search upstream
    pub apollo: UpstreamConfig,
    /// RapidAPI MLS listings upstream
    pub mls: UpstreamConfig,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            output_dir: std::env::temp_dir().join("leadfill"),
            output_ttl_secs: 3600,
            max_upload_bytes: 20 * 1024 * 1024,
            logging: LoggingConfig::default(),
            columns: ColumnConfig::default(),
            policy: PolicyConfig::default(),
            apollo: UpstreamConfig::default(),
            mls: UpstreamConfig::default(),
        }
    }
}

/// Input column mapping, required columns and output column names
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    #[serde(flatten)]
    pub mapping: ColumnMapping,
    /// Columns that must be present in every upload
    pub required: Vec<String>,
    pub output: ResultColumns,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            mapping: ColumnMapping::default(),
            required: vec![
                "MLS Number".to_string(),
                "First Name".to_string(),
                "Last Name".to_string(),
            ],
            output: ResultColumns::default(),
        }
    }
}

impl EnrichConfig {
    /// Locate, load and validate the service configuration
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        let config: Self = load_toml_config(path.as_deref())?;
        config.with_env_overrides().validated()
    }

    /// Overlay API keys from the environment (ENV beats TOML)
    pub fn with_env_overrides(mut self) -> Self {
        self.apollo.api_key =
            resolve_api_key(APOLLO_API_KEY_ENV, self.apollo.api_key.as_deref(), "Apollo");
        self.mls.api_key = resolve_api_key(MLS_API_KEY_ENV, self.mls.api_key.as_deref(), "MLS");
        self
    }

    /// Reject settings the service cannot run with
    pub fn validated(self) -> Result<Self> {
        if self.output_ttl_secs == 0 {
            return Err(Error::Config("output_ttl_secs must be at least 1".to_string()));
        }
        if self.policy.max_attempts == 0 {
            return Err(Error::Config("policy.max_attempts must be at least 1".to_string()));
        }
        if self.policy.strategy_order.is_empty() {
            return Err(Error::Config("policy.strategy_order must name at least one strategy".to_string()));
        }
        for upstream in [&self.apollo, &self.mls] {
            if upstream.timeout_secs == 0 {
                return Err(Error::Config("upstream timeout_secs must be at least 1".to_string()));
            }
            if upstream.requests_per_second == 0 {
                return Err(Error::Config(
                    "upstream requests_per_second must be at least 1".to_string(),
                ));
            }
        }
        Ok(self)
    }
}
