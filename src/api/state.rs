use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::observability::Metrics;
use crate::registry::JobRegistry;
use crate::search::{ImageSearch, SearchClient, SearchError};
use crate::worker::{FetchError, ImageFetch, ImageFetcher};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("search client: {0}")]
    Search(#[from] SearchError),
    #[error("image fetcher: {0}")]
    Fetch(#[from] FetchError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<JobRegistry>,
    pub search: Arc<dyn ImageSearch>,
    pub fetcher: Arc<dyn ImageFetch>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, search: Arc<dyn ImageSearch>, fetcher: Arc<dyn ImageFetch>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(JobRegistry::new()),
            search,
            fetcher,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Build the real provider client and fetcher from configuration
    pub fn from_config(config: Config) -> Result<Self, StateError> {
        let search = SearchClient::new(config.search.clone())?;
        let fetcher = ImageFetcher::new(&config.fetch)?;
        Ok(Self::new(config, Arc::new(search), Arc::new(fetcher)))
    }
}
