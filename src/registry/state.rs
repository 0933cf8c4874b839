use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::search::SearchQuery;
use crate::worker::Sink;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Starting,
    Searching,
    Downloading,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Starting => 0,
            JobStatus::Searching => 1,
            JobStatus::Downloading => 2,
            JobStatus::Completed | JobStatus::Failed => 3,
        }
    }

    /// Statuses only move forward one step at a time; `Failed` is reachable
    /// from any non-terminal status.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == JobStatus::Failed || next.rank() == self.rank() + 1
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// One failed item within a job
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub index: usize,
    pub code: String,
    pub message: String,
}

/// Mutable job record. Written by the job's worker, read by pollers.
#[derive(Debug)]
pub struct JobState {
    job_id: String,
    query: String,
    count: usize,
    status: JobStatus,
    message: String,
    total: usize,
    succeeded: usize,
    failed: usize,
    errors: Vec<ItemError>,
    sink: Option<Sink>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl JobState {
    pub fn new(job_id: String, query: &SearchQuery) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            query: query.text().to_string(),
            count: query.count(),
            status: JobStatus::Starting,
            message: "Initializing download...".to_string(),
            total: 0,
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
            sink: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn sink(&self) -> Option<&Sink> {
        self.sink.as_ref()
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn begin_search(&mut self) -> Result<(), TransitionError> {
        self.transition(JobStatus::Searching)?;
        self.message = "Searching for images...".to_string();
        Ok(())
    }

    pub fn begin_download(&mut self, total: usize) -> Result<(), TransitionError> {
        self.transition(JobStatus::Downloading)?;
        self.total = total;
        self.succeeded = 0;
        self.failed = 0;
        self.message = format!("Downloading {} images...", total);
        Ok(())
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
        self.message = format!("Downloaded {}/{} images", self.succeeded, self.total);
        self.touch();
    }

    pub fn record_failure(&mut self, index: usize, code: &str, message: String) {
        self.failed += 1;
        self.errors.push(ItemError {
            index,
            code: code.to_string(),
            message,
        });
        self.touch();
    }

    /// Publishes the finalized sink. Only valid from `Downloading`.
    pub fn complete(&mut self, sink: Sink) -> Result<(), TransitionError> {
        self.transition(JobStatus::Completed)?;
        self.message = format!("Successfully downloaded {} images", self.succeeded);
        self.sink = Some(sink);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(JobStatus::Failed)?;
        self.message = message.into();
        Ok(())
    }

    /// Copy of the counters without the sink bytes
    pub fn snapshot(&self) -> JobSnapshot {
        let (filename, directory) = match &self.sink {
            Some(Sink::Archive { filename, .. }) => (Some(filename.clone()), None),
            Some(Sink::Folder { path, .. }) => (None, Some(path.clone())),
            None => (None, None),
        };

        JobSnapshot {
            job_id: self.job_id.clone(),
            query: self.query.clone(),
            count: self.count,
            status: self.status,
            message: self.message.clone(),
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            progress: self.succeeded,
            errors: self.errors.clone(),
            filename,
            directory,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serializable point-in-time view of a job
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobSnapshot {
    pub job_id: String,
    pub query: String,
    pub count: usize,
    pub status: JobStatus,
    pub message: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub progress: usize,
    pub errors: Vec<ItemError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}
