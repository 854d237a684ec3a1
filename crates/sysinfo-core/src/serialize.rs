//! Canonical text encoding of an [`AggregateRecord`].
//!
//! Records are written as compact JSON objects, one string field per step, in
//! step execution order: `{"a":"1","b":"2"}`.

use std::io;

use crate::buffer::{AllocError, GrowableBuffer};
use crate::job::{AggregateRecord, JobError};

/// Serializes `record` into a freshly allocated buffer owned by the caller.
pub fn to_buffer(record: &AggregateRecord) -> Result<GrowableBuffer, JobError> {
    let mut buf = GrowableBuffer::new()?;
    serde_json::to_writer(&mut buf, record).map_err(write_error)?;
    Ok(buf)
}

/// Maps a writer failure back to the buffer growth that caused it.
fn write_error(e: serde_json::Error) -> JobError {
    if !e.is_io() {
        return JobError::Serialize(e.to_string());
    }
    let io_error = io::Error::from(e);
    let message = io_error.to_string();
    match io_error.into_inner().map(|inner| inner.downcast::<AllocError>()) {
        Some(Ok(alloc)) => JobError::OutOfMemory(*alloc),
        _ => JobError::Serialize(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::KeyValueSample;

    #[test]
    fn test_empty_record() {
        let buf = to_buffer(&AggregateRecord::new()).unwrap();
        assert_eq!(buf.as_bytes(), b"{}");
    }

    #[test]
    fn test_strings_are_escaped() {
        let mut record = AggregateRecord::new();
        record.insert(KeyValueSample::new("cpu_model", "Intel(R) \"Xeon\"\tE5"));
        let buf = to_buffer(&record).unwrap();
        assert_eq!(
            buf.as_bytes(),
            br#"{"cpu_model":"Intel(R) \"Xeon\"\tE5"}"#
        );
    }

    #[test]
    fn test_any_string_accepted_as_key() {
        let mut record = AggregateRecord::new();
        record.insert(KeyValueSample::new("", ""));
        record.insert(KeyValueSample::new("with space", "ünïcode"));
        let buf = to_buffer(&record).unwrap();
        let text = std::str::from_utf8(buf.as_bytes()).unwrap();
        assert_eq!(text, r#"{"":"","with space":"ünïcode"}"#);
    }

    #[test]
    fn test_output_grows_past_initial_capacity() {
        let mut record = AggregateRecord::new();
        for i in 0..50 {
            record.insert(KeyValueSample::new(format!("metric_{}", i), i.to_string()));
        }
        let buf = to_buffer(&record).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(buf.as_bytes()).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 50);
        assert_eq!(parsed["metric_49"], "49");
    }

    struct FailingWriter(io::Error);

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            let kind = self.0.kind();
            let inner = std::mem::replace(&mut self.0, io::Error::from(kind));
            Err(inner)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample_record() -> AggregateRecord {
        let mut record = AggregateRecord::new();
        record.insert(KeyValueSample::new("a", "1"));
        record
    }

    #[test]
    fn test_growth_failure_keeps_requested_size() {
        let writer = FailingWriter(AllocError { requested: 4096 }.into());
        let err = serde_json::to_writer(writer, &sample_record()).unwrap_err();
        assert_eq!(
            write_error(err),
            JobError::OutOfMemory(AllocError { requested: 4096 })
        );
    }

    #[test]
    fn test_other_io_failure_is_serialize_error() {
        let writer = FailingWriter(io::Error::other("pipe closed"));
        let err = serde_json::to_writer(writer, &sample_record()).unwrap_err();
        assert!(matches!(write_error(err), JobError::Serialize(msg) if msg.contains("pipe closed")));
    }
}
