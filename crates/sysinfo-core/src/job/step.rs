//! Steps and the producer contract they wrap.

use std::fmt;

/// One metric sample: the metric name (e.g. `cpu_speed_hz`) and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueSample {
    pub key: String,
    pub value: String,
}

impl KeyValueSample {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Anything that can produce one sample on demand.
///
/// Implemented for every `Fn() -> KeyValueSample` closure, so most steps are
/// built straight from closures.
pub trait Producer: Send + Sync {
    fn produce(&self) -> KeyValueSample;
}

impl<F> Producer for F
where
    F: Fn() -> KeyValueSample + Send + Sync,
{
    fn produce(&self) -> KeyValueSample {
        self()
    }
}

/// The smallest unit of a job: a producer and the link to the next step.
pub struct Step {
    producer: Box<dyn Producer>,
    pub(super) next: Option<Box<Step>>,
}

impl Step {
    /// Wraps `producer` in a step with no successor.
    pub fn new(producer: impl Producer + 'static) -> Self {
        Self {
            producer: Box::new(producer),
            next: None,
        }
    }

    /// Invokes the producer.
    pub fn sample(&self) -> KeyValueSample {
        self.producer.produce()
    }

    /// The step after this one, if any.
    pub fn next(&self) -> Option<&Step> {
        self.next.as_deref()
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Producer for Fixed {
        fn produce(&self) -> KeyValueSample {
            KeyValueSample::new("fixed", "42")
        }
    }

    #[test]
    fn test_step_from_closure() {
        let step = Step::new(|| KeyValueSample::new("cpu_speed_hz", "2400000000"));
        assert!(step.next().is_none());
        assert_eq!(
            step.sample(),
            KeyValueSample::new("cpu_speed_hz", "2400000000")
        );
    }

    #[test]
    fn test_step_from_producer_type() {
        let step = Step::new(Fixed);
        assert_eq!(step.sample().value, "42");
    }
}
