pub mod catalog;
pub mod header;
pub mod records;
pub mod worker;

pub use catalog::{decode_channels, ChannelDescriptor, SampleEncoding};
pub use header::{decode_header, RecordingHeader};
pub use records::{decode_records, DecodedRecords};
pub use worker::{decode_in_background, DecodeJob, DecodeRequest};

use crate::signal::ChannelSamples;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Decode failures that abort the current operation. Recoverable conditions
/// (out-of-bounds samples, unparseable samples-per-record fields) are logged
/// and counted instead of surfacing here.
#[derive(Debug, Error)]
pub enum EdfError {
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("malformed signal catalog: {0}")]
    MalformedCatalog(String),
    #[error("unsupported sample encoding '{0}'")]
    UnsupportedEncoding(String),
    #[error("background decode failed: {0}")]
    WorkerFailed(String),
}

/// Complete decode result, the same shape the upload boundary returns as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdfRecording {
    pub header: RecordingHeader,
    pub channels: Vec<ChannelDescriptor>,
    pub samples: Vec<ChannelSamples>,
    /// Samples dropped by the record decoder's bounds recovery.
    pub skipped_samples: usize,
}

/// Decode a whole in-memory EDF buffer. Header and catalog parse inline
/// (cheap fixed-size reads); the record walk runs on the background worker
/// and this call blocks on its single response.
pub fn decode_buffer(buffer: Vec<u8>) -> Result<EdfRecording, EdfError> {
    let header = decode_header(&buffer)?;
    let channels = decode_channels(&buffer, header.channel_count)?;
    let job = decode_in_background(DecodeRequest {
        buffer,
        header: header.clone(),
        channels: channels.clone(),
    });
    let decoded = job.wait()?;
    Ok(EdfRecording {
        header,
        channels,
        samples: decoded.channels,
        skipped_samples: decoded.skipped_samples,
    })
}

/// Read an EDF file from disk and decode it.
pub fn decode_file(path: &Path) -> anyhow::Result<EdfRecording> {
    let buffer =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_buffer(buffer).with_context(|| format!("decoding {}", path.display()))
}


#[cfg(test)]
mod tests {
    use super::testdata::{edf_buffer, TestChannel};
    use super::*;

    #[test]
    fn decodes_whole_buffer_through_worker() {
        let channels = vec![TestChannel::default(), TestChannel::default()];
        let records = vec![vec![vec![0, 1024, 2047, -1024], vec![0, 0, 0, 0]]];
        let buffer = edf_buffer(1, &channels, &records);
        let recording = decode_buffer(buffer).expect("decode");
        assert_eq!(recording.header.channel_count, 2);
        assert_eq!(recording.channels.len(), 2);
        assert_eq!(recording.samples.len(), 2);
        assert_eq!(recording.samples[0].len(), 4);
        assert_eq!(recording.skipped_samples, 0);
    }

    #[test]
    fn recording_roundtrips_through_json() {
        let channels = vec![TestChannel::default()];
        let records = vec![vec![vec![0, 1024, 2047, -1024]]];
        let recording = decode_buffer(edf_buffer(1, &channels, &records)).expect("decode");
        let json = serde_json::to_string(&recording).expect("serialize");
        let parsed: EdfRecording = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed.header, recording.header);
        assert_eq!(parsed.channels, recording.channels);
        assert_eq!(parsed.samples[0].points, recording.samples[0].points);
        assert_eq!(parsed.skipped_samples, 0);
    }

    #[test]
    fn malformed_header_aborts_decode() {
        let buffer = vec![b'x'; 512];
        assert!(matches!(
            decode_buffer(buffer),
            Err(EdfError::MalformedHeader(_))
        ));
    }
}
