//! Batch download job: search once, then fetch every result in order

use bon::Builder;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::http::{FetchError, ImageFetch};
use super::naming::entry_name;
use super::sink::{Sink, SinkError, SinkTarget, SinkWriter};
use crate::observability::Metrics;
use crate::registry::{JobEntry, JobSnapshot, JobState, TransitionError};
use crate::search::{ImageResult, ImageSearch, SearchError, SearchQuery, resolve};

/// Job-level faults. Any of these ends the job in `failed`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("No images found for this query")]
    NoResults,

    #[error("Output failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Cancelled")]
    Cancelled,

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Why a single item produced no output
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error("no usable image URL")]
    NoUrl,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("could not store image: {0}")]
    Write(String),
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::NoUrl => "no_url",
            FailureReason::Fetch(err) => err.code(),
            FailureReason::Write(_) => "write_error",
        }
    }
}

/// Result of attempting one search result
#[derive(Debug)]
pub enum DownloadOutcome {
    Success { bytes: Bytes, extension: &'static str },
    Failure(FailureReason),
}

/// One query's end-to-end execution.
///
/// Items are fetched sequentially in provider order with a pause between
/// them, so output indices always match provider positions.
#[derive(Builder)]
pub struct BatchDownloadJob {
    query: SearchQuery,
    search: Arc<dyn ImageSearch>,
    fetcher: Arc<dyn ImageFetch>,
    #[builder(default)]
    target: SinkTarget,
    #[builder(default = Duration::from_secs(15))]
    fetch_timeout: Duration,
    #[builder(default = Duration::from_millis(500))]
    politeness_delay: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl BatchDownloadJob {
    /// Drive the job to a terminal state and return the final snapshot.
    ///
    /// Never returns an error: every job-level fault is recorded as `failed`.
    pub async fn run(self, entry: Arc<JobEntry>) -> JobSnapshot {
        let job_id = entry.id();

        match self.execute(&entry).await {
            Ok(sink) => {
                let stored = sink.entries().len();
                match entry.update(|state| state.complete(sink)) {
                    Ok(()) => {
                        info!(job_id, stored, "Job completed");
                        self.count(Metrics::job_completed);
                    }
                    Err(err) => {
                        error!(job_id, error = %err, "Could not publish completion");
                        self.fail(&entry, err.to_string());
                    }
                }
            }
            Err(err) => {
                warn!(job_id, error = %err, "Job failed");
                self.fail(&entry, err.to_string());
            }
        }

        entry.snapshot()
    }

    fn fail(&self, entry: &JobEntry, message: String) {
        match entry.update(|state| state.fail(message)) {
            Ok(()) => self.count(Metrics::job_failed),
            Err(err) => debug!(job_id = entry.id(), error = %err, "Job already terminal"),
        }
    }

    fn count(&self, counter: fn(&Metrics)) {
        if let Some(metrics) = &self.metrics {
            counter(metrics);
        }
    }

    async fn execute(&self, entry: &JobEntry) -> Result<Sink, JobError> {
        let job_id = entry.id();

        entry.update(JobState::begin_search)?;
        info!(job_id, query = self.query.text(), count = self.query.count(), "Searching");

        let results = tokio::select! {
            results = self.search.search(&self.query) => results?,
            _ = entry.cancelled() => return Err(JobError::Cancelled),
        };
        if results.is_empty() {
            return Err(JobError::NoResults);
        }

        let total = results.len();
        entry.update(|state| state.begin_download(total))?;
        info!(job_id, total, "Downloading");

        let sanitized = self.query.sanitized();
        let mut writer = self.target.open(&sanitized)?;

        for (position, result) in results.iter().enumerate() {
            if position > 0 {
                self.pause(entry).await?;
            }

            let index = position + 1;
            let outcome = tokio::select! {
                outcome = self.download_item(result) => outcome,
                _ = entry.cancelled() => return Err(JobError::Cancelled),
            };
            self.record(entry, writer.as_mut(), &sanitized, index, outcome);
        }

        Ok(writer.finish()?)
    }

    async fn pause(&self, entry: &JobEntry) -> Result<(), JobError> {
        tokio::select! {
            _ = tokio::time::sleep(self.politeness_delay) => Ok(()),
            _ = entry.cancelled() => Err(JobError::Cancelled),
        }
    }

    async fn download_item(&self, result: &ImageResult) -> DownloadOutcome {
        let Some(url) = resolve(result) else {
            return DownloadOutcome::Failure(FailureReason::NoUrl);
        };

        match self.fetcher.fetch(url, self.fetch_timeout).await {
            Ok(image) => DownloadOutcome::Success {
                bytes: image.bytes,
                extension: image.extension,
            },
            Err(err) => DownloadOutcome::Failure(err.into()),
        }
    }

    fn record(
        &self,
        entry: &JobEntry,
        writer: &mut dyn SinkWriter,
        sanitized: &str,
        index: usize,
        outcome: DownloadOutcome,
    ) {
        let job_id = entry.id();

        let failure = match outcome {
            DownloadOutcome::Success { bytes, extension } => {
                let name = entry_name(sanitized, index, extension);
                match writer.write_entry(&name, &bytes) {
                    Ok(()) => {
                        debug!(job_id, index, name = %name, size = bytes.len(), "Image stored");
                        entry.update(JobState::record_success);
                        self.count(Metrics::image_downloaded);
                        return;
                    }
                    Err(err) => FailureReason::Write(err.to_string()),
                }
            }
            DownloadOutcome::Failure(reason) => reason,
        };

        warn!(job_id, index, code = failure.code(), error = %failure, "Image failed");
        entry.update(|state| state.record_failure(index, failure.code(), failure.to_string()));
        self.count(Metrics::image_failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{JobRegistry, JobStatus};
    use crate::worker::http::FetchedImage;
    use crate::worker::naming::infer_extension;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeSearch {
        response: Result<Vec<Value>, u16>,
    }

    #[async_trait]
    impl ImageSearch for FakeSearch {
        async fn search_raw(&self, _text: &str, count: usize) -> Result<Vec<Value>, SearchError> {
            match &self.response {
                Ok(records) => Ok(records.iter().take(count).cloned().collect()),
                Err(status) => Err(SearchError::Http {
                    status: *status,
                    body: "denied".to_string(),
                }),
            }
        }
    }

    /// Serves canned bodies by URL and records the order of requests
    #[derive(Default)]
    struct FakeFetcher {
        bodies: HashMap<String, &'static [u8]>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageFetch for FakeFetcher {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedImage, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.bodies.get(url) {
                Some(body) => Ok(FetchedImage {
                    bytes: Bytes::from_static(body),
                    extension: infer_extension(url, None),
                    content_type: None,
                }),
                None => Err(FetchError::Http(404)),
            }
        }
    }

    fn job(search: FakeSearch, fetcher: Arc<FakeFetcher>, text: &str) -> BatchDownloadJob {
        BatchDownloadJob::builder()
            .query(SearchQuery::new(text, 10, 50).unwrap())
            .search(Arc::new(search))
            .fetcher(fetcher)
            .politeness_delay(Duration::ZERO)
            .build()
    }

    #[tokio::test]
    async fn test_mixed_outcomes_complete_with_stable_indices() {
        let records = vec![
            json!({ "properties": { "url": "https://img.test/a.png" } }),
            json!({ "title": "no urls at all" }),
            json!({ "thumbnail": { "src": "https://img.test/b.gif" } }),
            json!({ "properties": { "url": "https://img.test/gone.jpg" } }),
        ];
        let fetcher = Arc::new(FakeFetcher {
            bodies: HashMap::from([
                ("https://img.test/a.png".to_string(), &b"a"[..]),
                ("https://img.test/b.gif".to_string(), &b"b"[..]),
            ]),
            ..Default::default()
        });

        let registry = JobRegistry::new();
        let job = job(FakeSearch { response: Ok(records) }, fetcher.clone(), "50 Cent");
        let entry = registry.create(&job.query);

        let snapshot = job.run(entry.clone()).await;
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.succeeded, 2);
        assert_eq!(snapshot.failed, 2);
        assert_eq!(snapshot.filename.as_deref(), Some("50_Cent_images.zip"));

        let codes: Vec<(usize, &str)> = snapshot
            .errors
            .iter()
            .map(|e| (e.index, e.code.as_str()))
            .collect();
        assert_eq!(codes, vec![(2, "no_url"), (4, "http_error")]);

        let sink = entry.sink().unwrap();
        assert_eq!(sink.entries(), ["50_Cent_01.png", "50_Cent_03.gif"]);

        // The unresolvable record never reached the fetcher
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec![
                "https://img.test/a.png",
                "https://img.test/b.gif",
                "https://img.test/gone.jpg"
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_successes_still_completes() {
        let records = vec![json!({}), json!({ "properties": { "url": "https://img.test/x.jpg" } })];
        let registry = JobRegistry::new();
        let job = job(
            FakeSearch { response: Ok(records) },
            Arc::new(FakeFetcher::default()),
            "nothing",
        );
        let entry = registry.create(&job.query);

        let snapshot = job.run(entry.clone()).await;
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.succeeded, 0);
        assert_eq!(snapshot.failed, 2);
        assert!(entry.sink().unwrap().entries().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_fails_job() {
        let registry = JobRegistry::new();
        let job = job(
            FakeSearch { response: Err(401) },
            Arc::new(FakeFetcher::default()),
            "cats",
        );
        let entry = registry.create(&job.query);

        let snapshot = job.run(entry.clone()).await;
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert!(snapshot.message.contains("401"));
        assert!(entry.sink().is_err());
    }

    #[tokio::test]
    async fn test_empty_results_fail_job() {
        let registry = JobRegistry::new();
        let metrics = Arc::new(Metrics::new());
        let job = BatchDownloadJob::builder()
            .query(SearchQuery::new("zzzz", 5, 50).unwrap())
            .search(Arc::new(FakeSearch { response: Ok(vec![]) }))
            .fetcher(Arc::new(FakeFetcher::default()))
            .metrics(metrics.clone())
            .build();
        let entry = registry.create(&job.query);

        let snapshot = job.run(entry).await;
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.message, "No images found for this query");
        assert_eq!(metrics.snapshot().jobs_failed, 1);
    }

    #[tokio::test]
    async fn test_cancellation_during_pause() {
        let records = vec![
            json!({ "properties": { "url": "https://img.test/1.jpg" } }),
            json!({ "properties": { "url": "https://img.test/2.jpg" } }),
        ];
        let fetcher = Arc::new(FakeFetcher {
            bodies: HashMap::from([
                ("https://img.test/1.jpg".to_string(), &b"1"[..]),
                ("https://img.test/2.jpg".to_string(), &b"2"[..]),
            ]),
            ..Default::default()
        });
        let registry = JobRegistry::new();
        let job = BatchDownloadJob::builder()
            .query(SearchQuery::new("slow", 5, 50).unwrap())
            .search(Arc::new(FakeSearch { response: Ok(records) }))
            .fetcher(fetcher.clone())
            .politeness_delay(Duration::from_secs(30))
            .build();
        let entry = registry.create(&job.query);

        let handle = tokio::spawn(job.run(entry.clone()));
        while entry.snapshot().succeeded == 0 {
            tokio::task::yield_now().await;
        }
        registry.cancel(entry.id()).unwrap();

        let snapshot = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.message, "Cancelled");
        assert_eq!(fetcher.requested.lock().unwrap().len(), 1);
    }
}
