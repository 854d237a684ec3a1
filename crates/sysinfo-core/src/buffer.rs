//! Append-only byte buffer used to materialize serialized snapshots.
//!
//! Capacity starts at [`INITIAL_CAPACITY`] and doubles until an append fits,
//! always leaving room for a trailing NUL so the content can be handed to
//! C-string consumers as-is. The buffer never shrinks.

use std::fmt;
use std::io;

/// Capacity allocated by [`GrowableBuffer::new`].
pub const INITIAL_CAPACITY: usize = 16;
const GROWTH_FACTOR: usize = 2;

/// The buffer could not reserve the memory an append required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocError {
    pub requested: usize,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not grow buffer to {} bytes", self.requested)
    }
}

impl std::error::Error for AllocError {}

impl From<AllocError> for io::Error {
    fn from(e: AllocError) -> Self {
        io::Error::new(io::ErrorKind::OutOfMemory, e)
    }
}

/// Growable, NUL-terminated byte buffer.
///
/// `data` always holds `len + 1` bytes, the last one being the terminator.
pub struct GrowableBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl GrowableBuffer {
    /// Allocates an empty buffer with [`INITIAL_CAPACITY`] bytes.
    pub fn new() -> Result<Self, AllocError> {
        let mut data = Vec::new();
        data.try_reserve_exact(INITIAL_CAPACITY)
            .map_err(|_| AllocError {
                requested: INITIAL_CAPACITY,
            })?;
        data.push(0);
        Ok(Self {
            data,
            capacity: INITIAL_CAPACITY,
        })
    }

    /// Appends `text` to the end of the buffer.
    pub fn append(&mut self, text: &str) -> Result<(), AllocError> {
        self.append_bytes(text.as_bytes())
    }

    /// Appends raw bytes, growing the buffer geometrically when needed.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), AllocError> {
        let required = self.len() + bytes.len() + 1;
        if required > self.capacity {
            self.grow_to(required)?;
        }

        // Drop the terminator, append, re-terminate.
        self.data.pop();
        self.data.extend_from_slice(bytes);
        self.data.push(0);
        Ok(())
    }

    fn grow_to(&mut self, required: usize) -> Result<(), AllocError> {
        let mut new_capacity = self.capacity.saturating_mul(GROWTH_FACTOR);
        while new_capacity < required {
            new_capacity = new_capacity.saturating_mul(GROWTH_FACTOR);
        }

        let additional = new_capacity - self.data.len();
        self.data
            .try_reserve_exact(additional)
            .map_err(|_| AllocError {
                requested: new_capacity,
            })?;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Number of content bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content bytes up to `len()`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Content bytes followed by the NUL terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }

    /// Frees the backing storage. The buffer is consumed and cannot be reused.
    pub fn release(self) {}

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Debug for GrowableBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl io::Write for GrowableBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
