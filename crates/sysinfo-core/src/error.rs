//! Errors surfaced to device callers.

use crate::buffer::AllocError;
use crate::job::JobError;

const EBUSY: i32 = 16;
const ENOMEM: i32 = 12;
const EFAULT: i32 = 14;
const EINVAL: i32 = 22;
const ENODATA: i32 = 61;

/// Error type for device operations.
///
/// Every variant is distinguishable from end-of-data, which is reported as
/// a successful [`ReadOutcome::EndOfData`](crate::session::ReadOutcome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device is already open. Retry after the holder closes it.
    Busy,
    /// The selected job has no steps or is not registered.
    NoData(String),
    /// A snapshot buffer could not be allocated or grown.
    OutOfMemory,
    /// Bytes could not be copied to the caller's destination, or the
    /// snapshot could not be produced.
    Fault(String),
    /// Unknown selector value or command.
    InvalidArgument(String),
}

impl DeviceError {
    /// Negative errno-style code for host glue that speaks integers.
    pub fn errno(&self) -> i32 {
        let code = match self {
            DeviceError::Busy => EBUSY,
            DeviceError::NoData(_) => ENODATA,
            DeviceError::OutOfMemory => ENOMEM,
            DeviceError::Fault(_) => EFAULT,
            DeviceError::InvalidArgument(_) => EINVAL,
        };
        -code
    }
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::Busy => write!(f, "device busy"),
            DeviceError::NoData(msg) => write!(f, "no data available: {}", msg),
            DeviceError::OutOfMemory => write!(f, "out of memory"),
            DeviceError::Fault(msg) => write!(f, "bad address: {}", msg),
            DeviceError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<AllocError> for DeviceError {
    fn from(_: AllocError) -> Self {
        DeviceError::OutOfMemory
    }
}

impl From<JobError> for DeviceError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::EmptyJob => DeviceError::NoData(e.to_string()),
            JobError::InvalidTitle(_) => DeviceError::InvalidArgument(e.to_string()),
            JobError::OutOfMemory(_) => DeviceError::OutOfMemory,
            JobError::Serialize(msg) => DeviceError::Fault(msg),
        }
    }
}

impl From<DeviceError> for std::io::Error {
    fn from(e: DeviceError) -> Self {
        let kind = match e {
            DeviceError::Busy => std::io::ErrorKind::ResourceBusy,
            DeviceError::NoData(_) => std::io::ErrorKind::NotFound,
            DeviceError::OutOfMemory => std::io::ErrorKind::OutOfMemory,
            DeviceError::Fault(_) => std::io::ErrorKind::Other,
            DeviceError::InvalidArgument(_) => std::io::ErrorKind::InvalidInput,
        };
        std::io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_codes() {
        assert_eq!(DeviceError::Busy.errno(), -16);
        assert_eq!(DeviceError::NoData(String::new()).errno(), -61);
        assert_eq!(DeviceError::OutOfMemory.errno(), -12);
        assert_eq!(DeviceError::Fault(String::new()).errno(), -14);
        assert_eq!(DeviceError::InvalidArgument(String::new()).errno(), -22);
    }

    #[test]
    fn test_job_error_mapping() {
        assert!(matches!(
            DeviceError::from(JobError::EmptyJob),
            DeviceError::NoData(_)
        ));
        assert_eq!(
            DeviceError::from(JobError::OutOfMemory(AllocError { requested: 64 })),
            DeviceError::OutOfMemory
        );
    }
}
