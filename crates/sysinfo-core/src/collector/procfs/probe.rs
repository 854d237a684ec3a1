//! Reads and parses `/proc` files on demand.

use std::path::{Path, PathBuf};

use crate::collector::procfs::parser::{
    CpuInfo, DiskStats, GlobalStat, LoadAvg, MemInfo, ParseError, parse_cpuinfo, parse_diskstats,
    parse_global_stat, parse_loadavg, parse_meminfo, parse_uptime, whole_disks,
};
use crate::collector::traits::FileSystem;

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// I/O error reading a `/proc` file.
    Io(PathBuf, std::io::Error),
    /// Parse error in a `/proc` file.
    Parse(PathBuf, String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(path, e) => write!(f, "I/O error reading {}: {}", path.display(), e),
            CollectError::Parse(path, msg) => {
                write!(f, "parse error in {}: {}", path.display(), msg)
            }
        }
    }
}

impl std::error::Error for CollectError {}

/// Aggregated I/O counters over whole disks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskTotals {
    pub disks: usize,
    pub reads: u64,
    pub read_sectors: u64,
    pub writes: u64,
    pub write_sectors: u64,
    pub io_time: u64,
}

/// Samples system-wide metrics from a proc root.
///
/// Every call re-reads its source file, so each job run sees current values.
#[derive(Debug, Clone)]
pub struct SystemProbe<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
}

impl<F: FileSystem> SystemProbe<F> {
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    pub fn proc_path(&self) -> &Path {
        &self.proc_path
    }

    /// Whether the proc root looks usable (has a `stat` file).
    pub fn is_available(&self) -> bool {
        self.fs.exists(&self.proc_path.join("stat"))
    }

    fn read<T, P>(&self, file: &str, parse: P) -> Result<T, CollectError>
    where
        P: FnOnce(&str) -> Result<T, ParseError>,
    {
        let path = self.proc_path.join(file);
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CollectError::Io(path.clone(), e))?;
        parse(&content).map_err(|e| CollectError::Parse(path, e.message))
    }

    pub fn meminfo(&self) -> Result<MemInfo, CollectError> {
        self.read("meminfo", parse_meminfo)
    }

    pub fn stat(&self) -> Result<GlobalStat, CollectError> {
        self.read("stat", parse_global_stat)
    }

    pub fn cpuinfo(&self) -> Result<CpuInfo, CollectError> {
        self.read("cpuinfo", parse_cpuinfo)
    }

    pub fn loadavg(&self) -> Result<LoadAvg, CollectError> {
        self.read("loadavg", parse_loadavg)
    }

    /// Seconds since boot.
    pub fn uptime(&self) -> Result<f64, CollectError> {
        self.read("uptime", parse_uptime)
    }

    /// Sums counters over whole disks, skipping partitions and virtual devices.
    pub fn disk_totals(&self) -> Result<DiskTotals, CollectError> {
        let disks: Vec<DiskStats> = self.read("diskstats", parse_diskstats)?;
        Ok(whole_disks(&disks)
            .into_iter()
            .fold(DiskTotals::default(), |mut acc, disk| {
                acc.disks += 1;
                acc.reads += disk.reads;
                acc.read_sectors += disk.read_sectors;
                acc.writes += disk.writes;
                acc.write_sectors += disk.write_sectors;
                acc.io_time += disk.io_time;
                acc
            }))
    }
}
