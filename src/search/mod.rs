//! Image search: provider client, result model and URL resolution
//!
//! ## Key Components
//!
//! - [`ImageSearch`] - Trait over the provider, so jobs can run against fakes
//! - [`SearchClient`] - reqwest-backed implementation
//! - [`SearchQuery`] - Validated query text and requested count
//! - [`ImageResult`] - Fields extracted from one provider record
//! - [`resolve`] - Picks the URL to download for a result

mod client;
mod models;
mod resolver;

pub use client::SearchClient;
pub use models::{ImageResult, QueryError, SearchQuery};
pub use resolver::resolve;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search credential is not configured")]
    MissingCredential,

    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("search request timed out")]
    Timeout,

    #[error("search request failed: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl SearchError {
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::MissingCredential => "missing_credential",
            SearchError::Http { .. } => "http_error",
            SearchError::Timeout => "timeout",
            SearchError::Transport(_) => "transport_error",
            SearchError::Malformed(_) => "malformed_response",
        }
    }
}

/// One round trip to the image-search provider.
///
/// Implementations never retry; a failure is returned to the caller as a
/// [`SearchError`] and the caller decides what it means for the job.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Raw provider records, in provider order, at most `count` of them
    async fn search_raw(&self, text: &str, count: usize) -> Result<Vec<Value>, SearchError>;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ImageResult>, SearchError> {
        let records = self.search_raw(query.text(), query.count()).await?;
        Ok(records.iter().map(ImageResult::from_value).collect())
    }
}
