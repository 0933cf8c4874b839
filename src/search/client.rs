//! HTTP client for the image-search provider

use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ImageSearch, SearchError};
use crate::config::SearchConfig;

const CREDENTIAL_HEADER: &str = "X-Subscription-Token";
const MAX_ERROR_BODY: usize = 512;

/// Issues image-search requests with the configured credential and locale defaults
pub struct SearchClient {
    client: Client,
    config: SearchConfig,
    api_key: String,
}

impl SearchClient {
    /// Build a client from configuration. Fails when no credential is configured.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SearchError::MissingCredential)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Requested count clamped to the provider cap
    pub fn effective_count(&self, requested: usize) -> usize {
        requested.min(self.config.max_results).max(1)
    }
}

#[async_trait]
impl ImageSearch for SearchClient {
    async fn search_raw(&self, text: &str, count: usize) -> Result<Vec<Value>, SearchError> {
        let count = self.effective_count(count);
        let count_param = count.to_string();
        let spellcheck = if self.config.spellcheck { "1" } else { "0" };

        debug!(query = text, count, endpoint = %self.config.endpoint, "Searching provider");

        let response = self
            .client
            .get(&self.config.endpoint)
            .header(ACCEPT, "application/json")
            .header(CREDENTIAL_HEADER, &self.api_key)
            .query(&[
                ("q", text),
                ("count", count_param.as_str()),
                ("safesearch", self.config.safesearch.as_str()),
                ("country", self.config.country.as_str()),
                ("search_lang", self.config.search_lang.as_str()),
                ("spellcheck", spellcheck),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            warn!(query = text, status = status.as_u16(), "Provider rejected search");
            return Err(SearchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|e| SearchError::Malformed(format!("invalid JSON: {}", e)))?;

        let records = payload
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchError::Malformed("missing 'results' list".to_string()))?;

        debug!(query = text, found = records.len(), "Provider responded");

        Ok(records.iter().take(count).cloned().collect())
    }
}

fn map_transport_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout
    } else {
        SearchError::Transport(err.to_string())
    }
}
