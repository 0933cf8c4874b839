//! Download worker
//!
//! Runs [`BatchDownloadJob`]s in the background: one tokio task per job,
//! with images fetched sequentially inside each job.

pub mod http;
pub mod naming;
pub mod runner;
pub mod sink;

pub use http::{FetchError, FetchedImage, ImageFetch, ImageFetcher};
pub use runner::{BatchDownloadJob, DownloadOutcome, FailureReason, JobError};
pub use sink::{Sink, SinkError, SinkTarget, SinkWriter};

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;

use crate::registry::JobEntry;

/// Start `job` on its own task and return immediately.
///
/// The job task is watched: if it panics or is aborted, the entry is moved
/// to `failed` instead of being left mid-state.
pub fn spawn(job: BatchDownloadJob, entry: Arc<JobEntry>) -> JoinHandle<()> {
    let watched = entry.clone();
    let task = tokio::spawn(job.run(entry));

    tokio::spawn(async move {
        if let Err(err) = task.await {
            error!(job_id = watched.id(), error = %err, "Job task aborted");
            let _ = watched.update(|state| state.fail(format!("Job aborted: {}", err)));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{JobRegistry, JobStatus};
    use crate::search::{ImageSearch, SearchError, SearchQuery};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::time::Duration;

    struct PanickingSearch;

    #[async_trait]
    impl ImageSearch for PanickingSearch {
        async fn search_raw(&self, _text: &str, _count: usize) -> Result<Vec<Value>, SearchError> {
            panic!("provider client bug");
        }
    }

    struct NeverFetch;

    #[async_trait]
    impl ImageFetch for NeverFetch {
        async fn fetch(&self, _url: &str, _timeout: Duration) -> Result<FetchedImage, FetchError> {
            Err(FetchError::Timeout)
        }
    }

    #[tokio::test]
    async fn test_panicking_job_ends_failed() {
        let registry = JobRegistry::new();
        let query = SearchQuery::new("boom", 3, 50).unwrap();
        let entry = registry.create(&query);

        let job = BatchDownloadJob::builder()
            .query(query)
            .search(Arc::new(PanickingSearch))
            .fetcher(Arc::new(NeverFetch))
            .build();

        spawn(job, entry.clone()).await.unwrap();

        let snapshot = entry.snapshot();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert!(snapshot.message.starts_with("Job aborted"));
    }
}
