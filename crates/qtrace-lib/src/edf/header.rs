use super::EdfError;
use log::warn;
use serde::{Deserialize, Serialize};

pub(crate) const PRIMARY_HEADER_LEN: usize = 256;
pub(crate) const CALIBRATION_BLOCK_LEN: usize = 256;

/// Recording metadata from the fixed 256-byte primary header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingHeader {
    pub version: String,
    pub patient_id: String,
    pub recording_id: String,
    pub start_date: String,
    pub start_time: String,
    /// Declared total header length; positions the first data record.
    pub header_bytes: usize,
    pub record_count: usize,
    pub record_duration_sec: i64,
    pub channel_count: usize,
}

impl RecordingHeader {
    pub fn record_duration_ms(&self) -> f64 {
        self.record_duration_sec as f64 * 1000.0
    }
}

/// Read a fixed-width ASCII field, trimming the space padding.
pub(crate) fn read_trimmed(buffer: &[u8], offset: usize, len: usize) -> String {
    let end = (offset + len).min(buffer.len());
    if offset >= end {
        return String::new();
    }
    buffer[offset..end]
        .iter()
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

fn numeric_field(buffer: &[u8], offset: usize, len: usize, name: &str) -> Result<i64, EdfError> {
    let text = read_trimmed(buffer, offset, len);
    text.parse::<i64>()
        .map_err(|_| EdfError::MalformedHeader(format!("{name} field is not numeric: '{text}'")))
}

fn non_negative(value: i64, name: &str) -> Result<usize, EdfError> {
    if value < 0 {
        return Err(EdfError::MalformedHeader(format!(
            "{name} is negative: {value}"
        )));
    }
    Ok(value as usize)
}

/// Decode the primary header from the start of an EDF buffer.
pub fn decode_header(buffer: &[u8]) -> Result<RecordingHeader, EdfError> {
    if buffer.len() < PRIMARY_HEADER_LEN {
        return Err(EdfError::MalformedHeader(format!(
            "buffer holds {} bytes, the primary header needs {}",
            buffer.len(),
            PRIMARY_HEADER_LEN
        )));
    }
    let header = RecordingHeader {
        version: read_trimmed(buffer, 0, 8),
        patient_id: read_trimmed(buffer, 8, 80),
        recording_id: read_trimmed(buffer, 88, 80),
        start_date: read_trimmed(buffer, 168, 8),
        start_time: read_trimmed(buffer, 176, 8),
        header_bytes: non_negative(
            numeric_field(buffer, 184, 8, "header byte length")?,
            "header byte length",
        )?,
        record_count: non_negative(numeric_field(buffer, 236, 8, "record count")?, "record count")?,
        record_duration_sec: numeric_field(buffer, 244, 8, "record duration")?,
        channel_count: non_negative(
            numeric_field(buffer, 252, 4, "channel count")?,
            "channel count",
        )?,
    };
    let expected = PRIMARY_HEADER_LEN + CALIBRATION_BLOCK_LEN * header.channel_count;
    if header.header_bytes != expected {
        warn!(
            "declared header length {} does not match {} expected for {} channels",
            header.header_bytes, expected, header.channel_count
        );
    }
    Ok(header)
}
