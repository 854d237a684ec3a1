//! Metric producers backed by the Linux `/proc` filesystem.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                SystemProbe<F>                │
//! │  /proc/stat  /proc/cpuinfo  /proc/loadavg    │
//! │  /proc/meminfo  /proc/diskstats  /proc/uptime│
//! └───────────────────────┬──────────────────────┘
//!                         │
//!                  ┌──────▼──────┐
//!                  │  FileSystem │ (trait)
//!                  └──────┬──────┘
//!              ┌──────────┴──────────┐
//!       ┌──────▼──────┐       ┌──────▼──────┐
//!       │   RealFs    │       │   MockFs    │
//!       │  (Linux)    │       │ (fixtures)  │
//!       └─────────────┘       └─────────────┘
//! ```
//!
//! ```
//! use sysinfo_core::collector::{MockFs, SystemProbe};
//!
//! let probe = SystemProbe::new(MockFs::typical_system(), "/proc");
//! assert_eq!(probe.meminfo().unwrap().mem_total, 16384000);
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{CollectError, SystemProbe};
pub use traits::{FileSystem, RealFs};
