use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::sync::Notify;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{RegistryError, Result};
use super::state::{JobSnapshot, JobState, JobStatus};
use crate::search::SearchQuery;
use crate::worker::Sink;

/// Registry entry for one job: its state behind a lock plus a cancel flag
#[derive(Debug)]
pub struct JobEntry {
    job_id: String,
    state: Mutex<JobState>,
    cancelled: AtomicBool,
    cancel_notify: Notify,
}

impl JobEntry {
    pub fn new(job_id: String, query: &SearchQuery) -> Self {
        Self {
            state: Mutex::new(JobState::new(job_id.clone(), query)),
            job_id,
            cancelled: AtomicBool::new(false),
            cancel_notify: Notify::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.job_id
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        // A panicked worker must not make the job unreadable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the state
    pub fn update<R>(&self, f: impl FnOnce(&mut JobState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn status(&self) -> JobStatus {
        self.lock().status()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.lock().snapshot()
    }

    /// The finalized sink of a completed job. Repeatable.
    pub fn sink(&self) -> Result<Sink> {
        let state = self.lock();
        if state.status() != JobStatus::Completed {
            return Err(RegistryError::NotCompleted {
                job_id: self.job_id.clone(),
                status: state.status(),
            });
        }

        state
            .sink()
            .cloned()
            .ok_or_else(|| RegistryError::SinkUnavailable(self.job_id.clone()))
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.cancel_notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`JobEntry::cancel`] has been called
    pub async fn cancelled(&self) {
        let notified = self.cancel_notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Process-wide table of job id -> job entry.
///
/// The map lock is only held for insert and lookup; each entry carries its
/// own lock, so jobs never contend with each other. Entries are never evicted.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Arc<JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job in `starting` and return its entry
    pub fn create(&self, query: &SearchQuery) -> Arc<JobEntry> {
        let job_id = Uuid::new_v4().to_string();
        let entry = Arc::new(JobEntry::new(job_id.clone(), query));

        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id.clone(), entry.clone());

        info!(job_id = %job_id, query = query.text(), count = query.count(), "Registered job");
        entry
    }

    pub fn entry(&self, job_id: &str) -> Result<Arc<JobEntry>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(job_id.to_string()))
    }

    pub fn get(&self, job_id: &str) -> Result<JobSnapshot> {
        Ok(self.entry(job_id)?.snapshot())
    }

    pub fn retrieve_sink(&self, job_id: &str) -> Result<Sink> {
        self.entry(job_id)?.sink()
    }

    /// Request cancellation; a no-op for jobs that already finished
    pub fn cancel(&self, job_id: &str) -> Result<JobSnapshot> {
        let entry = self.entry(job_id)?;
        if !entry.status().is_terminal() {
            debug!(job_id, "Cancellation requested");
            entry.cancel();
        }
        Ok(entry.snapshot())
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashSet;
    use std::thread;

    fn query() -> SearchQuery {
        SearchQuery::new("otters", 4, 50).unwrap()
    }

    fn complete(entry: &JobEntry) {
        entry.update(|state| {
            state.begin_search().unwrap();
            state.begin_download(1).unwrap();
            state.record_success();
            state
                .complete(Sink::Archive {
                    filename: "otters_images.zip".to_string(),
                    bytes: Bytes::from_static(b"zip"),
                    entries: vec!["otters_01.jpg".to_string()],
                })
                .unwrap();
        });
    }

    #[test]
    fn test_create_and_get() {
        let registry = JobRegistry::new();
        let entry = registry.create(&query());

        let snapshot = registry.get(entry.id()).unwrap();
        assert_eq!(snapshot.status, JobStatus::Starting);
        assert_eq!(snapshot.query, "otters");
        assert_eq!(snapshot.count, 4);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_job() {
        let registry = JobRegistry::new();
        assert!(matches!(registry.get("nope"), Err(RegistryError::NotFound(_))));
        assert!(matches!(
            registry.retrieve_sink("nope"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_sink_requires_completion_and_is_repeatable() {
        let registry = JobRegistry::new();
        let entry = registry.create(&query());

        assert!(matches!(
            registry.retrieve_sink(entry.id()),
            Err(RegistryError::NotCompleted { status: JobStatus::Starting, .. })
        ));

        complete(&entry);

        let first = registry.retrieve_sink(entry.id()).unwrap();
        let second = registry.retrieve_sink(entry.id()).unwrap();
        assert_eq!(first.entries(), second.entries());
    }

    #[test]
    fn test_cancel_is_noop_after_completion() {
        let registry = JobRegistry::new();
        let entry = registry.create(&query());
        complete(&entry);

        let snapshot = registry.cancel(entry.id()).unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert!(!entry.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let registry = JobRegistry::new();
        let entry = registry.create(&query());

        let waiter = {
            let entry = entry.clone();
            tokio::spawn(async move { entry.cancelled().await })
        };
        tokio::task::yield_now().await;

        registry.cancel(entry.id()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();

        // Already-cancelled entries resolve immediately
        entry.cancelled().await;
    }

    #[test]
    fn test_concurrent_creation_yields_distinct_ids() {
        let registry = Arc::new(JobRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|_| registry.create(&query()).id().to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<String> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(ids.len(), 200);
        assert_eq!(registry.len(), 200);
        for id in &ids {
            assert_eq!(registry.get(id).unwrap().job_id, *id);
        }
    }
}
