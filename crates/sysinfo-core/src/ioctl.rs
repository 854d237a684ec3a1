//! Control commands, encoded the way Linux `_IO`/`_IOR`/`_IOW` encode them.
//!
//! Command word layout: `dir:2 | size:14 | type:8 | nr:8`, high bits first.

use crate::error::DeviceError;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const IOC_NONE: u32 = 0;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const fn ioc(dir: u32, ty: u8, nr: u8, size: u32) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | (size << IOC_SIZESHIFT)
}

/// Command type byte shared by every command.
pub const MAGIC: u8 = b'M';

/// No-op liveness check.
pub const PING: u32 = ioc(IOC_NONE, MAGIC, 1, 0);
/// Returns the active job selector.
pub const GET_JOB: u32 = ioc(IOC_READ, MAGIC, 2, 4);
/// Sets the active job selector from the argument.
pub const SET_JOB: u32 = ioc(IOC_WRITE, MAGIC, 3, 4);
/// Returns the device read count.
pub const GET_READ_COUNT: u32 = ioc(IOC_READ, MAGIC, 4, 8);

/// A decoded control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    GetJob,
    SetJob(u32),
    GetReadCount,
}

impl Command {
    /// Decodes a raw command word and its argument.
    pub fn decode(cmd: u32, arg: u64) -> Result<Self, DeviceError> {
        match cmd {
            PING => Ok(Command::Ping),
            GET_JOB => Ok(Command::GetJob),
            SET_JOB => u32::try_from(arg).map(Command::SetJob).map_err(|_| {
                DeviceError::InvalidArgument(format!("job selector {} out of range", arg))
            }),
            GET_READ_COUNT => Ok(Command::GetReadCount),
            other => Err(DeviceError::InvalidArgument(format!(
                "unknown command {:#010x}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_matches_linux_macros() {
        // _IO('M', 1), _IOR('M', 2, int), _IOW('M', 3, int)
        assert_eq!(PING, 0x0000_4d01);
        assert_eq!(GET_JOB, 0x8004_4d02);
        assert_eq!(SET_JOB, 0x4004_4d03);
        assert_eq!(GET_READ_COUNT, 0x8008_4d04);
    }

    #[test]
    fn test_decode() {
        assert_eq!(Command::decode(PING, 0).unwrap(), Command::Ping);
        assert_eq!(Command::decode(SET_JOB, 2).unwrap(), Command::SetJob(2));
        assert_eq!(
            Command::decode(GET_READ_COUNT, 99).unwrap(),
            Command::GetReadCount
        );
    }

    #[test]
    fn test_unknown_command_rejected() {
        let err = Command::decode(0xdead_beef, 0).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidArgument(_)));
    }

    #[test]
    fn test_selector_overflow_rejected() {
        let err = Command::decode(SET_JOB, u64::MAX).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidArgument(_)));
    }
}
