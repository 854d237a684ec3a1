//! sysinfo-core: telemetry snapshots served through a device-style interface.
//!
//! Provides:
//! - `buffer`: growable, NUL-terminated output buffer
//! - `job`: producer steps, jobs and the aggregate record they build
//! - `serialize`: compact JSON rendering of an aggregate record
//! - `jobs`: the selector → job table and the standard `/proc` jobs
//! - `collector`: filesystem abstraction and `/proc` parsers
//! - `state`: counters and selector shared by all handles
//! - `session`: chunked reads over a snapshot
//! - `device`: open/close, reads, job selection and the status report
//! - `ioctl`: control command encoding
//! - `error`: device error codes

pub mod buffer;
pub mod collector;
pub mod device;
pub mod error;
pub mod ioctl;
pub mod job;
pub mod jobs;
pub mod serialize;
pub mod session;
pub mod state;

pub use device::{Device, OpenDevice, StatusFile};
pub use error::DeviceError;
pub use session::ReadOutcome;
pub use state::{JobKind, SharedTelemetryState};
