//! The device facade hosts call into: open/close, chunked reads, job
//! selection, control commands and the status report.

use std::io;
use std::sync::Arc;

use chrono::SecondsFormat;
use tracing::{debug, info};

use crate::buffer::GrowableBuffer;
use crate::error::DeviceError;
use crate::ioctl::Command;
use crate::jobs::JobTable;
use crate::session::{ChunkSink, ReadOutcome, ReadSession};
use crate::state::{JobKind, SharedTelemetryState};

/// Telemetry device: a job table plus the shared state it reports through.
#[derive(Debug)]
pub struct Device {
    jobs: JobTable,
    state: Arc<SharedTelemetryState>,
}

impl Device {
    pub fn new(jobs: JobTable, state: Arc<SharedTelemetryState>) -> Self {
        Self { jobs, state }
    }

    pub fn state(&self) -> &Arc<SharedTelemetryState> {
        &self.state
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Opens the device. Only one handle may be open at a time; a second
    /// open fails with [`DeviceError::Busy`].
    pub fn open(&self) -> Result<OpenDevice<'_>, DeviceError> {
        self.state.acquire_open_guard().inspect_err(|_| {
            debug!("open rejected, device busy");
        })?;
        info!("device opened");
        Ok(OpenDevice {
            device: self,
            session: ReadSession::new(),
            position: 0,
        })
    }

    /// Selects the job for the next read cycle by raw selector value.
    pub fn select_job(&self, raw: u32) -> Result<(), DeviceError> {
        let kind = JobKind::try_from(raw)?;
        self.select(kind);
        Ok(())
    }

    pub fn select(&self, kind: JobKind) {
        let previous = self.state.set_active_job(kind);
        if previous != kind {
            info!(from = %previous, to = %kind, "active job changed");
        }
    }

    pub fn active_job(&self) -> JobKind {
        self.state.active_job()
    }

    /// Number of read cycles started on this device.
    pub fn read_count(&self) -> u64 {
        self.state.read_count()
    }

    /// Nanoseconds since the shared state was created, from a monotonic clock.
    pub fn uptime_since_load(&self) -> u64 {
        u64::try_from(self.state.uptime_since_load().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Executes a control command. See [`crate::ioctl`] for command words.
    pub fn ioctl(&self, cmd: u32, arg: u64) -> Result<u64, DeviceError> {
        match Command::decode(cmd, arg)? {
            Command::Ping => Ok(0),
            Command::GetJob => Ok(self.active_job() as u64),
            Command::SetJob(raw) => self.select_job(raw).map(|()| 0),
            Command::GetReadCount => Ok(self.read_count()),
        }
    }

    /// Opens the status report. It is not subject to the open guard and
    /// reading it does not count as a device read.
    pub fn status(&self) -> StatusFile<'_> {
        StatusFile {
            device: self,
            session: ReadSession::new(),
            position: 0,
        }
    }

    /// Runs the active job. The selector is sampled once here, so a cycle
    /// serves a single job even if the selector changes mid-cycle.
    fn render_snapshot(&self) -> Result<GrowableBuffer, DeviceError> {
        let kind = self.state.active_job();
        let job = self
            .jobs
            .get(kind)
            .ok_or_else(|| DeviceError::NoData(format!("no job registered for {}", kind)))?;
        let snapshot = job.run()?;
        let read_count = self.state.increment_read_count();
        debug!(
            job = %job.title(),
            bytes = snapshot.len(),
            read_count,
            "snapshot rendered"
        );
        Ok(snapshot)
    }

    fn render_status(&self) -> Result<GrowableBuffer, DeviceError> {
        let kind = self.state.active_job();
        let title = self.jobs.get(kind).map_or(kind.as_str(), |job| job.title());
        let loaded_at = self
            .state
            .loaded_at()
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut buf = GrowableBuffer::new()?;
        buf.append(&format!("read_count: {}\n", self.read_count()))?;
        buf.append(&format!("current_info_type: {}\n", title))?;
        buf.append(&format!("uptime_ns: {}\n", self.uptime_since_load()))?;
        buf.append(&format!("loaded_at: {}\n", loaded_at))?;
        Ok(buf)
    }
}

/// An open handle on a [`Device`]. Closing or dropping it releases the open
/// guard.
pub struct OpenDevice<'a> {
    device: &'a Device,
    session: ReadSession,
    /// Cursor used by the `io::Read` implementation.
    position: u64,
}

impl OpenDevice<'_> {
    /// Reads the next chunk of the current snapshot at `*offset`.
    ///
    /// A read at offset 0 takes a fresh snapshot of the active job.
    pub fn read_at<S>(&mut self, sink: &mut S, offset: &mut u64) -> Result<ReadOutcome, DeviceError>
    where
        S: ChunkSink + ?Sized,
    {
        let device = self.device;
        self.session.read(sink, offset, || device.render_snapshot())
    }

    /// Resets the `io::Read` cursor so the next read starts a new cycle.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Closes the handle.
    pub fn close(self) {}
}

impl Drop for OpenDevice<'_> {
    fn drop(&mut self) {
        self.session.release();
        self.device.state.release_open_guard();
        info!("device closed");
    }
}

impl io::Read for OpenDevice<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut position = self.position;
        let outcome = self.read_at(buf, &mut position)?;
        self.position = position;
        Ok(match outcome {
            ReadOutcome::Data(n) => n,
            ReadOutcome::EndOfData => 0,
        })
    }
}

/// Read-only view of the device counters, in `key: value` lines.
pub struct StatusFile<'a> {
    device: &'a Device,
    session: ReadSession,
    position: u64,
}

impl StatusFile<'_> {
    /// Reads the next chunk of the status report at `*offset`.
    pub fn read_at<S>(&mut self, sink: &mut S, offset: &mut u64) -> Result<ReadOutcome, DeviceError>
    where
        S: ChunkSink + ?Sized,
    {
        let device = self.device;
        self.session.read(sink, offset, || device.render_status())
    }

    /// Resets the `io::Read` cursor so the next read renders a fresh report.
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl io::Read for StatusFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut position = self.position;
        let outcome = self.read_at(buf, &mut position)?;
        self.position = position;
        Ok(match outcome {
            ReadOutcome::Data(n) => n,
            ReadOutcome::EndOfData => 0,
        })
    }
}
