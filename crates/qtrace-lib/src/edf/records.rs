use super::catalog::{ChannelDescriptor, SampleEncoding};
use super::header::RecordingHeader;
use crate::signal::ChannelSamples;
use log::warn;
use serde::{Deserialize, Serialize};

/// Every channel's calibrated sample sequence plus recovery diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedRecords {
    pub channels: Vec<ChannelSamples>,
    /// Samples whose byte range fell outside the buffer and were skipped.
    pub skipped_samples: usize,
}

/// Walk the interleaved data records and produce one physical-unit sample
/// sequence per channel. A corrupt sample offset never aborts the decode:
/// the sample is skipped, logged, and counted.
pub fn decode_records(
    buffer: &[u8],
    header: &RecordingHeader,
    channels: &[ChannelDescriptor],
) -> DecodedRecords {
    let record_bytes: usize = channels
        .iter()
        .map(|ch| ch.samples_per_record * ch.encoding.byte_width())
        .sum();
    let record_duration_ms = header.record_duration_ms();

    let mut out: Vec<ChannelSamples> = channels
        .iter()
        .map(|ch| ChannelSamples {
            label: ch.label.clone(),
            unit: ch.physical_unit.clone(),
            points: Vec::with_capacity(header.record_count * ch.samples_per_record),
        })
        .collect();
    let mut skipped = 0usize;

    for record in 0..header.record_count {
        let record_start = header.header_bytes + record * record_bytes;
        let record_base_ms = record as f64 * record_duration_ms;
        let mut channel_offset = 0usize;
        for (idx, ch) in channels.iter().enumerate() {
            let width = ch.encoding.byte_width();
            for j in 0..ch.samples_per_record {
                let offset = record_start + channel_offset + j * width;
                let raw = match read_code(buffer, offset, ch.encoding) {
                    Some(value) => value,
                    None => {
                        warn!(
                            "record {}: sample {} of channel '{}' falls outside the buffer (offset {})",
                            record, j, ch.label, offset
                        );
                        skipped += 1;
                        continue;
                    }
                };
                let timestamp = record_base_ms
                    + (j as f64 / ch.samples_per_record as f64) * record_duration_ms;
                out[idx].points.push([timestamp, ch.rescale(raw)]);
            }
            channel_offset += ch.samples_per_record * width;
        }
    }

    if skipped > 0 {
        warn!("record decode skipped {skipped} out-of-bounds samples");
    }
    DecodedRecords {
        channels: out,
        skipped_samples: skipped,
    }
}

fn read_code(buffer: &[u8], offset: usize, encoding: SampleEncoding) -> Option<f64> {
    let end = offset.checked_add(encoding.byte_width())?;
    let bytes = buffer.get(offset..end)?;
    let value = match encoding {
        SampleEncoding::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
        SampleEncoding::Int32 => {
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
        }
        SampleEncoding::Float32 => {
            f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
        }
        SampleEncoding::Float64 => f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]),
    };
    Some(value)
}
