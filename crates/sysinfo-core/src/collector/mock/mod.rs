//! In-memory filesystem fixtures for producer tests and non-Linux hosts.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
