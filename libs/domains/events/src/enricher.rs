//! Canonical event lookup by source URL.

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{EventError, EventResult};
use crate::models::EventDetails;

pub const DEFAULT_LOOKUP_URL: &str = "https://outsideapi.com/fed-gw/graphql";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const EVENT_BY_URL_QUERY: &str = r#"
query GetAthleticEventByUrl($url: String!) {
  athleticEventByURL(url: $url) {
    eventId
    name
    date
    city
    state
    eventUrl
  }
}
"#;

/// Resolves a source URL to the event's canonical fields.
///
/// `Ok(None)` means the service answered and knows no such event. Transport
/// failures, non-2xx answers and malformed bodies are `Err`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventLookup: Send + Sync {
    async fn fetch_canonical_event(&self, source_url: &str) -> EventResult<Option<EventDetails>>;
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl LookupConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL)
    }
}

impl FromEnv for LookupConfig {
    /// - EVENT_LOOKUP_URL: defaults to the public GraphQL gateway
    /// - EVENT_LOOKUP_TIMEOUT_SECS: defaults to 10
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env_or_default("EVENT_LOOKUP_URL", DEFAULT_LOOKUP_URL);
        let timeout_secs = env_parse_or("EVENT_LOOKUP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self::new(endpoint).with_timeout(Duration::from_secs(timeout_secs)))
    }
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    url: &'a str,
}

/// GraphQL client for the athletic event gateway.
#[derive(Debug, Clone)]
pub struct GraphqlEventLookup {
    client: Client,
    config: LookupConfig,
}

impl GraphqlEventLookup {
    pub fn new(config: LookupConfig) -> EventResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl EventLookup for GraphqlEventLookup {
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    async fn fetch_canonical_event(&self, source_url: &str) -> EventResult<Option<EventDetails>> {
        let request = GraphqlRequest {
            query: EVENT_BY_URL_QUERY,
            variables: Variables { url: source_url },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EventError::Upstream(format!(
                "lookup service error ({}): {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EventError::Upstream(format!("malformed lookup response: {}", e)))?;

        let details = extract_event(body)?;
        debug!(found = details.is_some(), "Event lookup finished");
        Ok(details)
    }
}

/// Pulls `data.athleticEventByURL` out of a GraphQL response body.
///
/// A missing or null event is `None`; a present event with the wrong shape is
/// an upstream error.
pub fn extract_event(body: Value) -> EventResult<Option<EventDetails>> {
    if !body.is_object() {
        return Err(EventError::Upstream(
            "malformed lookup response: expected a JSON object".to_string(),
        ));
    }

    match body.pointer("/data/athleticEventByURL") {
        None | Some(Value::Null) => Ok(None),
        Some(event) => serde_json::from_value(event.clone())
            .map(Some)
            .map_err(|e| EventError::Upstream(format!("malformed event payload: {}", e))),
    }
}
