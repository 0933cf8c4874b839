//! Request and response bodies of the HTTP API.
//!
//! Job status is served as [`crate::registry::JobSnapshot`] directly.
//!
//! A submission (as JSON):
//!
//! ```json
//! { "query": "red panda", "count": 10 }
//! ```
//!
//! `count` is optional and falls back to `server.default_count`. Numeric
//! strings such as `"10"` are accepted as well.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::observability::MetricsSnapshot;

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub count: Option<CountValue>,
}

/// `count` as clients send it: a JSON number or a numeric string
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum CountValue {
    Number(i64),
    Text(String),
}

impl CountValue {
    /// Negative or non-numeric values come out as 0 and fail range validation
    pub fn as_count(&self) -> usize {
        match self {
            CountValue::Number(n) => usize::try_from(*n).unwrap_or(0),
            CountValue::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobAcceptedResponse {
    pub success: bool,
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DebugSearchRequest {
    #[serde(default)]
    pub query: String,
}

/// First raw provider record for a query, for inspecting the provider schema
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DebugSearchResponse {
    pub success: bool,
    pub result_count: usize,
    pub first_result: Value,
    pub available_fields: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub jobs: usize,
    pub metrics: MetricsSnapshot,
}
