//! The selector → job table and the standard `/proc`-backed jobs.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::collector::{CollectError, FileSystem, SystemProbe};
use crate::job::{Job, JobError, KeyValueSample, Producer};
use crate::state::JobKind;

/// Value reported by a step whose source could not be sampled.
pub const UNAVAILABLE: &str = "unavailable";

/// Jobs addressable by selector.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: BTreeMap<JobKind, Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `job` under `kind`, returning the job it replaced.
    pub fn insert(&mut self, kind: JobKind, job: Job) -> Option<Job> {
        self.jobs.insert(kind, job)
    }

    pub fn with(mut self, kind: JobKind, job: Job) -> Self {
        self.insert(kind, job);
        self
    }

    pub fn get(&self, kind: JobKind) -> Option<&Job> {
        self.jobs.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = JobKind> + '_ {
        self.jobs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Builds the cpu, memory and disk jobs over `fs` rooted at `proc_path`.
pub fn standard_jobs<F>(fs: F, proc_path: impl Into<PathBuf>) -> Result<JobTable, JobError>
where
    F: FileSystem + 'static,
{
    let probe = Arc::new(SystemProbe::new(fs, proc_path));
    Ok(JobTable::new()
        .with(JobKind::Cpu, cpu_job(&probe)?)
        .with(JobKind::Memory, memory_job(&probe)?)
        .with(JobKind::Disk, disk_job(&probe)?))
}

/// Wraps a probe read in a producer. Read failures are logged and reported
/// as [`UNAVAILABLE`] so one bad source does not sink the whole job.
fn sampled<F, R>(
    probe: &Arc<SystemProbe<F>>,
    key: &'static str,
    read: R,
) -> impl Producer + 'static
where
    F: FileSystem + 'static,
    R: Fn(&SystemProbe<F>) -> Result<String, CollectError> + Send + Sync + 'static,
{
    let probe = Arc::clone(probe);
    move || {
        let value = read(&probe).unwrap_or_else(|e| {
            warn!(key, error = %e, "metric source unavailable");
            UNAVAILABLE.to_string()
        });
        KeyValueSample::new(key, value)
    }
}

pub fn cpu_job<F: FileSystem + 'static>(probe: &Arc<SystemProbe<F>>) -> Result<Job, JobError> {
    let mut job = Job::new(
        JobKind::Cpu.as_str(),
        sampled(probe, "cpu_model", |p| Ok(p.cpuinfo()?.model)),
    )?;
    job.append_step(sampled(probe, "cpu_speed_hz", |p| {
        Ok(p.cpuinfo()?
            .mhz
            .map(|mhz| format!("{:.0}", mhz * 1_000_000.0))
            .unwrap_or_else(|| UNAVAILABLE.to_string()))
    }))?;
    job.append_step(sampled(probe, "cpu_count", |p| {
        Ok(p.stat()?.cpu_count().to_string())
    }))?;
    job.append_step(sampled(probe, "cpu_busy_ticks", |p| {
        Ok(p.stat()?.total().map_or(0, |cpu| cpu.busy()).to_string())
    }))?;
    job.append_step(sampled(probe, "cpu_idle_ticks", |p| {
        Ok(p.stat()?.total().map_or(0, |cpu| cpu.idle_total()).to_string())
    }))?;
    job.append_step(sampled(probe, "load_avg_1m", |p| {
        Ok(format!("{:.2}", p.loadavg()?.load1))
    }))?;
    job.append_step(sampled(probe, "load_avg_5m", |p| {
        Ok(format!("{:.2}", p.loadavg()?.load5))
    }))?;
    job.append_step(sampled(probe, "load_avg_15m", |p| {
        Ok(format!("{:.2}", p.loadavg()?.load15))
    }))?;
    job.append_step(sampled(probe, "uptime_s", |p| Ok(format!("{:.2}", p.uptime()?))))?;
    Ok(job)
}

pub fn memory_job<F: FileSystem + 'static>(probe: &Arc<SystemProbe<F>>) -> Result<Job, JobError> {
    let mut job = Job::new(
        JobKind::Memory.as_str(),
        sampled(probe, "mem_total_kb", |p| Ok(p.meminfo()?.mem_total.to_string())),
    )?;
    job.append_step(sampled(probe, "mem_free_kb", |p| {
        Ok(p.meminfo()?.mem_free.to_string())
    }))?;
    job.append_step(sampled(probe, "mem_available_kb", |p| {
        Ok(p.meminfo()?.mem_available.to_string())
    }))?;
    job.append_step(sampled(probe, "mem_cached_kb", |p| {
        Ok(p.meminfo()?.cached.to_string())
    }))?;
    job.append_step(sampled(probe, "swap_total_kb", |p| {
        Ok(p.meminfo()?.swap_total.to_string())
    }))?;
    job.append_step(sampled(probe, "swap_free_kb", |p| {
        Ok(p.meminfo()?.swap_free.to_string())
    }))?;
    Ok(job)
}

pub fn disk_job<F: FileSystem + 'static>(probe: &Arc<SystemProbe<F>>) -> Result<Job, JobError> {
    let mut job = Job::new(
        JobKind::Disk.as_str(),
        sampled(probe, "disk_count", |p| Ok(p.disk_totals()?.disks.to_string())),
    )?;
    job.append_step(sampled(probe, "disk_reads", |p| {
        Ok(p.disk_totals()?.reads.to_string())
    }))?;
    job.append_step(sampled(probe, "disk_read_sectors", |p| {
        Ok(p.disk_totals()?.read_sectors.to_string())
    }))?;
    job.append_step(sampled(probe, "disk_writes", |p| {
        Ok(p.disk_totals()?.writes.to_string())
    }))?;
    job.append_step(sampled(probe, "disk_write_sectors", |p| {
        Ok(p.disk_totals()?.write_sectors.to_string())
    }))?;
    job.append_step(sampled(probe, "disk_io_ms", |p| {
        Ok(p.disk_totals()?.io_time.to_string())
    }))?;
    Ok(job)
}
