use thiserror::Error;

use super::state::JobStatus;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job {job_id} is not completed yet (status: {status:?})")]
    NotCompleted { job_id: String, status: JobStatus },

    #[error("Output for job {0} is not available")]
    SinkUnavailable(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
