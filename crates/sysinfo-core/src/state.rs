//! Process-wide telemetry state shared by every device handle.
//!
//! Each field has its own mutex. Updates to one field are atomic, but there
//! is no atomicity across fields: a selector change can land while a
//! snapshot for the previous selector is being computed.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::error::DeviceError;

/// Which job the next snapshot is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u32)]
pub enum JobKind {
    #[default]
    Cpu = 0,
    Memory = 1,
    Disk = 2,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::Cpu, JobKind::Memory, JobKind::Disk];

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Cpu => "cpu",
            JobKind::Memory => "memory",
            JobKind::Disk => "disk",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u32> for JobKind {
    type Error = DeviceError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(JobKind::Cpu),
            1 => Ok(JobKind::Memory),
            2 => Ok(JobKind::Disk),
            other => Err(DeviceError::InvalidArgument(format!(
                "unknown job selector {}",
                other
            ))),
        }
    }
}

impl FromStr for JobKind {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DeviceError::InvalidArgument(format!("unknown job {:?}", s)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counters and selectors shared across device handles.
#[derive(Debug)]
pub struct SharedTelemetryState {
    read_count: Mutex<u64>,
    active_job: Mutex<JobKind>,
    open: Mutex<bool>,
    loaded_at: Instant,
    loaded_wall: DateTime<Utc>,
}

impl SharedTelemetryState {
    /// Creates fresh state and records the load timestamp.
    pub fn new(initial_job: JobKind) -> Self {
        Self {
            read_count: Mutex::new(0),
            active_job: Mutex::new(initial_job),
            open: Mutex::new(false),
            loaded_at: Instant::now(),
            loaded_wall: Utc::now(),
        }
    }

    /// Bumps the read counter and returns the new value.
    pub fn increment_read_count(&self) -> u64 {
        let mut count = lock(&self.read_count);
        *count += 1;
        *count
    }

    pub fn read_count(&self) -> u64 {
        *lock(&self.read_count)
    }

    /// Swaps the active job, returning the previous one.
    pub fn set_active_job(&self, kind: JobKind) -> JobKind {
        std::mem::replace(&mut *lock(&self.active_job), kind)
    }

    pub fn active_job(&self) -> JobKind {
        *lock(&self.active_job)
    }

    /// Marks the device open, failing with [`DeviceError::Busy`] if it
    /// already is.
    pub fn acquire_open_guard(&self) -> Result<(), DeviceError> {
        let mut open = lock(&self.open);
        if *open {
            return Err(DeviceError::Busy);
        }
        *open = true;
        Ok(())
    }

    /// Marks the device closed. Returns whether it was open.
    pub fn release_open_guard(&self) -> bool {
        std::mem::replace(&mut *lock(&self.open), false)
    }

    pub fn is_open(&self) -> bool {
        *lock(&self.open)
    }

    /// Monotonic time elapsed since this state was created.
    pub fn uptime_since_load(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    /// Wall-clock time this state was created.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_wall
    }
}

impl Default for SharedTelemetryState {
    fn default() -> Self {
        Self::new(JobKind::default())
    }
}
