//! RapidAPI MLS listing strategy
//!
//! Looks up the listing agent for an MLS number:
//! `GET /listing?mlsId=<identifier>` with RapidAPI key/host headers.
//! Requires a non-blank identifier.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{StrategyKind, UpstreamClient, UpstreamConfig};
use crate::models::{ContactFragment, ContactQuery};
use crate::resolver::adapters::{apply_adapters, contact_from_object, object_at, top_level, ShapeAdapter};
use crate::resolver::{LookupStrategy, StrategyError};

/// RapidAPI MLS listings base URL
pub const MLS_BASE_URL: &str = "https://us-real-estate-listings.p.rapidapi.com";

const LISTING_PATH: &str = "/listing";

const RAPIDAPI_KEY_HEADER: &str = "X-RapidAPI-Key";
const RAPIDAPI_HOST_HEADER: &str = "X-RapidAPI-Host";

/// Keys under which a listing nests its agent, in preference order
const AGENT_KEYS: &[&str] = &["listAgent", "listing_agent", "agent"];

/// Listing payload shapes, in the order they are tried
const LISTING_SHAPES: &[ShapeAdapter] = &[agent_shape, listing_shape, data_shape, top_level];

/// First agent object with a contact; empty when agent keys are present but
/// none of them carries one
fn agent_shape(body: &Value) -> Option<ContactFragment> {
    let mut agents = AGENT_KEYS
        .iter()
        .filter_map(|key| object_at(body, key))
        .peekable();
    agents.peek()?;
    Some(agents.find(ContactFragment::is_match).unwrap_or_default())
}

fn listing_shape(body: &Value) -> Option<ContactFragment> {
    match body.get("listing")? {
        Value::Null => Some(ContactFragment::default()),
        listing if listing.is_object() => Some(listing_contact(listing)),
        _ => None,
    }
}

fn data_shape(body: &Value) -> Option<ContactFragment> {
    match body.get("data")? {
        Value::Null => Some(ContactFragment::default()),
        Value::Array(items) => Some(items.first().map(listing_contact).unwrap_or_default()),
        listing if listing.is_object() => Some(listing_contact(listing)),
        _ => None,
    }
}

/// Agent contact of one listing object, else contact fields on the listing itself
fn listing_contact(listing: &Value) -> ContactFragment {
    AGENT_KEYS
        .iter()
        .filter_map(|key| object_at(listing, key))
        .find(ContactFragment::is_match)
        .unwrap_or_else(|| contact_from_object(listing))
}

/// MLS listing lookup by identifier
pub struct MlsListingStrategy {
    client: Arc<UpstreamClient>,
    host: String,
}

impl MlsListingStrategy {
    pub fn new(client: Arc<UpstreamClient>, config: &UpstreamConfig) -> Self {
        let host = config
            .host
            .clone()
            .or_else(|| host_of(client.base_url()))
            .unwrap_or_default();
        Self { client, host }
    }
}

fn host_of(base_url: &str) -> Option<String> {
    reqwest::Url::parse(base_url)
        .ok()?
        .host_str()
        .map(str::to_string)
}

#[async_trait]
impl LookupStrategy for MlsListingStrategy {
    fn name(&self) -> &str {
        StrategyKind::MlsListing.as_str()
    }

    fn can_attempt(&self, query: &ContactQuery) -> bool {
        query.identifier.is_some()
    }

    async fn lookup(&self, query: &ContactQuery) -> Result<ContactFragment, StrategyError> {
        let identifier = query.identifier.as_deref().unwrap_or_default();
        let request = self
            .client
            .http()
            .get(self.client.url(LISTING_PATH))
            .query(&[("mlsId", identifier)])
            .header(RAPIDAPI_KEY_HEADER, self.client.api_key())
            .header(RAPIDAPI_HOST_HEADER, &self.host);

        let body = self.client.execute(request).await?;
        apply_adapters(&body, LISTING_SHAPES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_agent_shape() {
        let body = json!({ "listAgent": { "agent_email": "agent@realty.com", "office_phone": "555-0101" } });
        let fragment = apply_adapters(&body, LISTING_SHAPES).unwrap();
        assert_eq!(fragment.email.as_deref(), Some("agent@realty.com"));
        assert_eq!(fragment.phone.as_deref(), Some("555-0101"));
    }

    #[test]
    fn test_null_agent_key_falls_through_to_next_alias() {
        let body = json!({ "listAgent": null, "agent": { "email": "real@agent.com" } });
        let fragment = apply_adapters(&body, LISTING_SHAPES).unwrap();
        assert_eq!(fragment.email.as_deref(), Some("real@agent.com"));
    }

    #[test]
    fn test_agent_keys_without_contact_are_no_match() {
        let body = json!({ "listAgent": null, "agent": { "name": "Pat" } });
        let fragment = apply_adapters(&body, LISTING_SHAPES).unwrap();
        assert!(!fragment.is_match());
    }

    #[test]
    fn test_data_list_nested_agent() {
        let body = json!({
            "data": [ { "mls": "123", "agent": { "email": "a@b.com", "phone": null } } ]
        });
        let fragment = apply_adapters(&body, LISTING_SHAPES).unwrap();
        assert_eq!(fragment.email.as_deref(), Some("a@b.com"));
        assert_eq!(fragment.phone, None);
    }

    #[test]
    fn test_data_empty_is_no_match() {
        let fragment = apply_adapters(&json!({ "data": [] }), LISTING_SHAPES).unwrap();
        assert!(!fragment.is_match());
    }

    #[test]
    fn test_listing_fields_on_listing_itself() {
        let body = json!({ "listing": { "agent_phone": "555-0102" } });
        let fragment = apply_adapters(&body, LISTING_SHAPES).unwrap();
        assert_eq!(fragment.phone.as_deref(), Some("555-0102"));
    }

    #[test]
    fn test_top_level_fields() {
        let fragment = apply_adapters(&json!({ "email": "top@x.com" }), LISTING_SHAPES).unwrap();
        assert_eq!(fragment.email.as_deref(), Some("top@x.com"));
    }

    #[test]
    fn test_unknown_shape_is_malformed() {
        let result = apply_adapters(&json!({ "status": "ok" }), LISTING_SHAPES);
        assert!(matches!(result, Err(StrategyError::MalformedResponse(_))));
    }

    #[test]
    fn test_host_derived_from_base_url() {
        assert_eq!(host_of(MLS_BASE_URL).as_deref(), Some("us-real-estate-listings.p.rapidapi.com"));
        assert_eq!(host_of("not a url"), None);
    }
}
