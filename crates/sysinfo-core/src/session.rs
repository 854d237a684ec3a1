//! Chunked reads over a snapshot.
//!
//! A read cycle starts with a read at offset 0, which renders a fresh
//! snapshot. Subsequent reads copy up to the requested number of bytes from
//! the caller's offset and advance it. Once the offset reaches the end of the
//! snapshot the next read reports [`ReadOutcome::EndOfData`] and releases the
//! buffer; a read at offset 0 then starts the next cycle.
//!
//! ```text
//!   IDLE ──read@0──▶ SNAPSHOT_READY ──offset >= len──▶ EOF (release) ──▶ IDLE
//!                     │        ▲
//!                     └─read───┘  copy min(requested, len - offset)
//! ```

use tracing::debug;

use crate::buffer::GrowableBuffer;
use crate::error::DeviceError;

/// Result of a successful read call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were copied to the sink.
    Data(usize),
    /// The snapshot is exhausted. Nothing was copied.
    EndOfData,
}

/// Where a read copies its chunk to.
///
/// This is the caller side of a read: it says how many bytes were asked for
/// and accepts the chunk. A copy that cannot complete is a
/// [`DeviceError::Fault`].
pub trait ChunkSink {
    /// Number of bytes the caller asked for.
    fn requested_len(&self) -> usize;

    /// Copies `chunk` to the start of the destination.
    fn copy_chunk(&mut self, chunk: &[u8]) -> Result<(), DeviceError>;
}

impl ChunkSink for [u8] {
    fn requested_len(&self) -> usize {
        self.len()
    }

    fn copy_chunk(&mut self, chunk: &[u8]) -> Result<(), DeviceError> {
        let capacity = self.len();
        let dest = self.get_mut(..chunk.len()).ok_or_else(|| {
            DeviceError::Fault(format!(
                "destination holds {} bytes, chunk is {}",
                capacity,
                chunk.len()
            ))
        })?;
        dest.copy_from_slice(chunk);
        Ok(())
    }
}

/// Coarse state of a session, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    SnapshotReady,
}

/// Per-handle read state: the snapshot of the current cycle, if any.
///
/// The offset cursor is owned by the caller, the way a file position is.
#[derive(Debug, Default)]
pub struct ReadSession {
    snapshot: Option<GrowableBuffer>,
}

impl ReadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.snapshot.is_some() {
            SessionState::SnapshotReady
        } else {
            SessionState::Idle
        }
    }

    /// Length of the current snapshot, 0 when idle.
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, GrowableBuffer::len)
    }

    /// Performs one read call.
    ///
    /// `render` is invoked only when `*offset == 0`. If it fails the session
    /// stays idle and the error is returned. On success the chunk is copied
    /// into `sink` and `*offset` advances by the number of bytes copied; on a
    /// copy fault the offset is left untouched.
    ///
    /// A zero-length request returns `Data(0)` without rendering or touching
    /// the session, so it never starts or ends a cycle.
    pub fn read<S, R>(
        &mut self,
        sink: &mut S,
        offset: &mut u64,
        render: R,
    ) -> Result<ReadOutcome, DeviceError>
    where
        S: ChunkSink + ?Sized,
        R: FnOnce() -> Result<GrowableBuffer, DeviceError>,
    {
        if sink.requested_len() == 0 {
            return Ok(ReadOutcome::Data(0));
        }

        if *offset == 0 {
            // A stale, undrained snapshot must not survive a failed render.
            self.release();
            let snapshot = render()?;
            debug!(bytes = snapshot.len(), "read cycle started");
            self.snapshot = Some(snapshot);
        }

        let snapshot_len = self.snapshot_len();
        let pos = usize::try_from(*offset).unwrap_or(usize::MAX);
        if pos >= snapshot_len {
            if self.release() {
                debug!(bytes = snapshot_len, "read cycle reached end of data");
            }
            return Ok(ReadOutcome::EndOfData);
        }

        let count = sink.requested_len().min(snapshot_len - pos);
        let chunk = match &self.snapshot {
            Some(snapshot) => &snapshot.as_bytes()[pos..pos + count],
            None => return Ok(ReadOutcome::EndOfData),
        };
        sink.copy_chunk(chunk)?;
        *offset += count as u64;
        Ok(ReadOutcome::Data(count))
    }

    /// Drops the current snapshot. Returns whether there was one.
    pub fn release(&mut self) -> bool {
        match self.snapshot.take() {
            Some(snapshot) => {
                snapshot.release();
                true
            }
            None => false,
        }
    }
}
