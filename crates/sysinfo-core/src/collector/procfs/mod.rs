//! Sampling system metrics from the Linux `/proc` filesystem.

pub mod parser;
mod probe;

pub use parser::ParseError;
pub use probe::{CollectError, DiskTotals, SystemProbe};
