//! Jobs: ordered chains of metric-producing steps.
//!
//! A [`Job`] owns a forward-only chain of [`Step`]s. Running it invokes every
//! step's producer once, in chain order, folds the samples into an
//! [`AggregateRecord`] and serializes the record into a
//! [`GrowableBuffer`](crate::buffer::GrowableBuffer).
//!
//! ```
//! use sysinfo_core::job::{Job, KeyValueSample};
//!
//! let mut job = Job::new("demo", || KeyValueSample::new("a", "1")).unwrap();
//! job.append_step(|| KeyValueSample::new("b", "2")).unwrap();
//!
//! let snapshot = job.run().unwrap();
//! assert_eq!(snapshot.as_bytes(), br#"{"a":"1","b":"2"}"#);
//! ```

mod pipeline;
mod record;
mod step;

pub use pipeline::Job;
pub use record::AggregateRecord;
pub use step::{KeyValueSample, Producer, Step};

use crate::buffer::AllocError;

/// Error type for job construction and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job has no head step, so there is nothing to run or append to.
    EmptyJob,
    /// Job titles must contain at least one non-whitespace character.
    InvalidTitle(String),
    /// The snapshot buffer could not grow.
    OutOfMemory(AllocError),
    /// The record could not be encoded.
    Serialize(String),
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::EmptyJob => write!(f, "job has no steps"),
            JobError::InvalidTitle(title) => write!(f, "invalid job title {:?}", title),
            JobError::OutOfMemory(e) => write!(f, "out of memory: {}", e),
            JobError::Serialize(msg) => write!(f, "serialization failed: {}", msg),
        }
    }
}

impl std::error::Error for JobError {}

impl From<AllocError> for JobError {
    fn from(e: AllocError) -> Self {
        JobError::OutOfMemory(e)
    }
}
