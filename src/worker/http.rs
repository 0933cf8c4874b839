//! HTTP client for downloading image bytes

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, header::CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::naming::infer_extension;
use crate::config::FetchConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Connection timeout")]
    Timeout,

    #[error("HTTP {0}")]
    Http(u16),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Image exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

impl FetchError {
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::Http(_) => "http_error",
            FetchError::Transport(_) => "transport_error",
            FetchError::TooLarge { .. } => "too_large",
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Fully downloaded image with its inferred extension
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    pub extension: &'static str,
    pub content_type: Option<String>,
}

/// Downloads one image. No retries: a failure only affects that image.
#[async_trait]
pub trait ImageFetch: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedImage>;
}

/// reqwest-backed image downloader
pub struct ImageFetcher {
    client: Client,
    max_bytes: u64,
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            max_bytes: config.max_image_bytes.as_u64(),
        })
    }
}

#[async_trait]
impl ImageFetch for ImageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedImage> {
        debug!(url, "Starting download");

        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        // Chunked so the size cap holds even without Content-Length
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(map_transport_error)? {
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let extension = infer_extension(url, content_type.as_deref());
        debug!(url, size = body.len(), extension, "Download completed");

        Ok(FetchedImage {
            bytes: body.freeze(),
            extension,
            content_type,
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}
