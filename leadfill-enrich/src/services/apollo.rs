//! Apollo.io people-search strategies
//!
//! Two strategies share one [`UpstreamClient`] (and so one rate budget):
//! - `apollo_match`: `POST /v1/people/match` with first/last/full name
//! - `apollo_search`: `POST /v1/mixed_people/search` with the full name as keywords
//!
//! Both require a non-blank full name.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{StrategyKind, UpstreamClient};
use crate::models::{ContactFragment, ContactQuery};
use crate::resolver::adapters::{apply_adapters, first_in_list, object_at, ShapeAdapter};
use crate::resolver::{LookupStrategy, StrategyError};

/// Apollo API base URL
pub const APOLLO_BASE_URL: &str = "https://api.apollo.io";

const MATCH_PATH: &str = "/v1/people/match";
const SEARCH_PATH: &str = "/v1/mixed_people/search";

/// API key header
const API_KEY_HEADER: &str = "X-Api-Key";

/// People-match payload shapes, in the order they are tried
const MATCH_SHAPES: &[ShapeAdapter] = &[person_shape, contact_shape, matches_shape];

/// Keyword-search payload shapes, in the order they are tried
const SEARCH_SHAPES: &[ShapeAdapter] = &[people_shape, contacts_shape];

fn person_shape(body: &Value) -> Option<ContactFragment> {
    object_at(body, "person")
}

fn contact_shape(body: &Value) -> Option<ContactFragment> {
    object_at(body, "contact")
}

fn matches_shape(body: &Value) -> Option<ContactFragment> {
    first_in_list(body, "matches")
}

fn people_shape(body: &Value) -> Option<ContactFragment> {
    first_in_list(body, "people")
}

fn contacts_shape(body: &Value) -> Option<ContactFragment> {
    first_in_list(body, "contacts")
}

/// Apollo people match by name
pub struct ApolloMatchStrategy {
    client: Arc<UpstreamClient>,
}

impl ApolloMatchStrategy {
    pub fn new(client: Arc<UpstreamClient>) -> Self {
        Self { client }
    }

    fn request_body(query: &ContactQuery) -> Value {
        json!({
            "first_name": query.first_name,
            "last_name": query.last_name,
            "name": query.full_name,
        })
    }
}

#[async_trait]
impl LookupStrategy for ApolloMatchStrategy {
    fn name(&self) -> &str {
        StrategyKind::ApolloMatch.as_str()
    }

    fn can_attempt(&self, query: &ContactQuery) -> bool {
        query.full_name.is_some()
    }

    async fn lookup(&self, query: &ContactQuery) -> Result<ContactFragment, StrategyError> {
        let request = self
            .client
            .http()
            .post(self.client.url(MATCH_PATH))
            .header(API_KEY_HEADER, self.client.api_key())
            .json(&Self::request_body(query));

        let body = self.client.execute(request).await?;
        apply_adapters(&body, MATCH_SHAPES)
    }
}

/// Apollo keyword search by full name
pub struct ApolloSearchStrategy {
    client: Arc<UpstreamClient>,
}

impl ApolloSearchStrategy {
    pub fn new(client: Arc<UpstreamClient>) -> Self {
        Self { client }
    }

    fn request_body(full_name: &str) -> Value {
        json!({
            "q_keywords": full_name,
            "page": 1,
            "per_page": 1,
        })
    }
}

#[async_trait]
impl LookupStrategy for ApolloSearchStrategy {
    fn name(&self) -> &str {
        StrategyKind::ApolloSearch.as_str()
    }

    fn can_attempt(&self, query: &ContactQuery) -> bool {
        query.full_name.is_some()
    }

    async fn lookup(&self, query: &ContactQuery) -> Result<ContactFragment, StrategyError> {
        let full_name = query.full_name.as_deref().unwrap_or_default();
        let request = self
            .client
            .http()
            .post(self.client.url(SEARCH_PATH))
            .header(API_KEY_HEADER, self.client.api_key())
            .json(&Self::request_body(full_name));

        let body = self.client.execute(request).await?;
        apply_adapters(&body, SEARCH_SHAPES)
    }
}
