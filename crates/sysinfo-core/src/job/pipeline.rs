//! The job itself: a title plus an owned chain of steps.

use std::fmt;

use tracing::trace;

use super::JobError;
use super::record::AggregateRecord;
use super::step::{Producer, Step};
use crate::buffer::GrowableBuffer;
use crate::serialize;

/// A titled, ordered chain of steps executed as a unit.
pub struct Job {
    title: String,
    head: Option<Box<Step>>,
}

impl Job {
    /// Creates a job whose first step wraps `first`.
    ///
    /// Fails with [`JobError::InvalidTitle`] if `title` is blank.
    pub fn new(title: impl Into<String>, first: impl Producer + 'static) -> Result<Self, JobError> {
        let mut job = Self::empty(title)?;
        job.head = Some(Box::new(Step::new(first)));
        Ok(job)
    }

    /// Creates a job with no steps. It cannot run or accept appends until
    /// a head exists, so this is mostly useful for callers that build the
    /// head lazily via [`Job::set_head`].
    pub fn empty(title: impl Into<String>) -> Result<Self, JobError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(JobError::InvalidTitle(title));
        }
        Ok(Self { title, head: None })
    }

    /// Installs the head step, dropping any existing chain.
    pub fn set_head(&mut self, producer: impl Producer + 'static) {
        self.head = Some(Box::new(Step::new(producer)));
    }

    /// Appends a step at the tail of the chain.
    ///
    /// Walks the chain to find the tail, so appends are O(n) in the number
    /// of steps. Rejects jobs without a head.
    pub fn append_step(&mut self, producer: impl Producer + 'static) -> Result<(), JobError> {
        if self.head.is_none() {
            return Err(JobError::EmptyJob);
        }

        let mut slot = &mut self.head;
        while let Some(step) = slot {
            slot = &mut step.next;
        }
        *slot = Some(Box::new(Step::new(producer)));
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of steps in the chain.
    pub fn len(&self) -> usize {
        self.steps().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterates the chain from head to tail.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        std::iter::successors(self.head.as_deref(), |step| step.next())
    }

    /// Runs every step once, in chain order, and collects the samples.
    pub fn collect(&self) -> Result<AggregateRecord, JobError> {
        if self.head.is_none() {
            return Err(JobError::EmptyJob);
        }

        let mut record = AggregateRecord::new();
        for step in self.steps() {
            let sample = step.sample();
            trace!(job = %self.title, key = %sample.key, "step sampled");
            record.insert(sample);
        }
        Ok(record)
    }

    /// Runs the job and serializes the result into a fresh buffer.
    ///
    /// The caller owns the returned buffer.
    pub fn run(&self) -> Result<GrowableBuffer, JobError> {
        let record = self.collect()?;
        serialize::to_buffer(&record)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("title", &self.title)
            .field("steps", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::KeyValueSample;
    use std::sync::{Arc, Mutex};

    fn recording(log: &Arc<Mutex<Vec<usize>>>, id: usize) -> impl Producer + 'static {
        let log = Arc::clone(log);
        move || {
            log.lock().unwrap().push(id);
            KeyValueSample::new(format!("k{}", id), id.to_string())
        }
    }

    #[test]
    fn test_new_job_has_one_step() {
        let job = Job::new("cpu", || KeyValueSample::new("a", "1")).unwrap();
        assert_eq!(job.title(), "cpu");
        assert_eq!(job.len(), 1);
        assert!(!job.is_empty());
    }

    #[test]
    fn test_blank_title_rejected() {
        let result = Job::new("  ", || KeyValueSample::new("a", "1"));
        assert!(matches!(result, Err(JobError::InvalidTitle(_))));
    }

    #[test]
    fn test_run_invokes_steps_in_append_order_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut job = Job::new("ordered", recording(&log, 0)).unwrap();
        for id in 1..5 {
            job.append_step(recording(&log, id)).unwrap();
        }
        assert_eq!(job.len(), 5);

        let record = job.collect().unwrap();

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(record.len(), 5);
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4"]);
    }

    #[test]
    fn test_colliding_keys_collapse() {
        let mut job = Job::new("dup", || KeyValueSample::new("a", "1")).unwrap();
        job.append_step(|| KeyValueSample::new("b", "2")).unwrap();
        job.append_step(|| KeyValueSample::new("a", "3")).unwrap();

        let record = job.collect().unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some("3"));
    }

    #[test]
    fn test_empty_job_faults() {
        let job = Job::empty("nothing").unwrap();
        assert!(job.is_empty());
        assert_eq!(job.len(), 0);
        assert_eq!(job.run().unwrap_err(), JobError::EmptyJob);
    }

    #[test]
    fn test_append_to_empty_job_rejected() {
        let mut job = Job::empty("nothing").unwrap();
        let err = job
            .append_step(|| KeyValueSample::new("a", "1"))
            .unwrap_err();
        assert_eq!(err, JobError::EmptyJob);

        job.set_head(|| KeyValueSample::new("a", "1"));
        job.append_step(|| KeyValueSample::new("b", "2")).unwrap();
        assert_eq!(job.len(), 2);
    }

    #[test]
    fn test_demo_job_serializes_in_step_order() {
        let mut job = Job::new("demo", || KeyValueSample::new("a", "1")).unwrap();
        job.append_step(|| KeyValueSample::new("b", "2")).unwrap();

        let snapshot = job.run().unwrap();
        assert_eq!(snapshot.as_bytes(), br#"{"a":"1","b":"2"}"#);
    }
}
