use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query is required")]
    EmptyText,
    #[error("Count must be between 1 and {max}")]
    CountOutOfRange { count: usize, max: usize },
}

/// Text query plus the number of images requested for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    text: String,
    count: usize,
}

impl SearchQuery {
    /// Validates a query: text must be non-blank, `count` in `1..=max_count`
    pub fn new(text: &str, count: usize, max_count: usize) -> Result<Self, QueryError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QueryError::EmptyText);
        }

        if !(1..=max_count).contains(&count) {
            return Err(QueryError::CountOutOfRange {
                count,
                max: max_count,
            });
        }

        Ok(Self {
            text: text.to_string(),
            count,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Query text with path-unsafe characters replaced, used for file and folder names
    pub fn sanitized(&self) -> String {
        crate::worker::naming::sanitize_query(&self.text)
    }
}

/// One provider result, reduced to the fields the downloader cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub title: Option<String>,
    /// Page the image was found on
    pub page_url: Option<String>,
    /// Full-resolution image location (`properties.url`)
    pub direct_url: Option<String>,
    /// Provider-hosted thumbnail (`thumbnail.src`)
    pub thumbnail_url: Option<String>,
}

impl ImageResult {
    /// Extracts fields from a raw provider record.
    ///
    /// Records vary a lot between responses, so anything that is missing or
    /// has an unexpected shape simply ends up as `None`.
    pub fn from_value(value: &Value) -> Self {
        let text = |pointer: &str| {
            value
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };

        Self {
            title: text("/title"),
            page_url: text("/url"),
            direct_url: text("/properties/url"),
            thumbnail_url: text("/thumbnail/src"),
        }
    }
}
