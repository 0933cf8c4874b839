//! In-memory job tracking
//!
//! Every submitted job gets a [`JobEntry`] in the process-wide [`JobRegistry`].
//! The job's worker is the only writer of an entry; the HTTP layer reads it to
//! answer status polls and to hand out the finished archive.
//!
//! ## Lifecycle
//!
//! `starting -> searching -> downloading -> completed`, with `failed`
//! reachable from any non-terminal status. Terminal states never change.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use imagebox::registry::JobRegistry;
//!
//! let registry = JobRegistry::new();
//! let entry = registry.create(&query);
//! let snapshot = registry.get(entry.id())?;
//! ```

pub mod error;
pub mod state;
pub mod store;

pub use error::{RegistryError, Result};
pub use state::{ItemError, JobSnapshot, JobState, JobStatus, TransitionError};
pub use store::{JobEntry, JobRegistry};
