use super::header::{read_trimmed, CALIBRATION_BLOCK_LEN, PRIMARY_HEADER_LEN};
use super::EdfError;
use log::warn;
use serde::{Deserialize, Serialize};

/// Fixed-width sample encodings a channel may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    Int16,
    Int32,
    Float32,
    Float64,
}

impl SampleEncoding {
    pub fn byte_width(&self) -> usize {
        match self {
            SampleEncoding::Int16 => 2,
            SampleEncoding::Int32 | SampleEncoding::Float32 => 4,
            SampleEncoding::Float64 => 8,
        }
    }

    /// Resolve the declared tag from a calibration block's reserved tail.
    /// A blank tag falls back to 16-bit integers, the EDF default.
    fn from_tag(tag: &str) -> Result<Self, EdfError> {
        if tag.is_empty() {
            return Ok(SampleEncoding::Int16);
        }
        match tag.to_ascii_lowercase().as_str() {
            "int16" => Ok(SampleEncoding::Int16),
            "int32" => Ok(SampleEncoding::Int32),
            "float32" => Ok(SampleEncoding::Float32),
            "float64" => Ok(SampleEncoding::Float64),
            _ => Err(EdfError::UnsupportedEncoding(tag.to_string())),
        }
    }
}

/// Calibration metadata for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub label: String,
    pub transducer: String,
    pub physical_unit: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i64,
    pub digital_max: i64,
    pub prefiltering: String,
    pub samples_per_record: usize,
    pub encoding: SampleEncoding,
}

impl ChannelDescriptor {
    /// Affine digital→physical rescale from the declared calibration ranges.
    /// Degenerate digital ranges clamp to the physical minimum.
    pub fn rescale(&self, raw: f64) -> f64 {
        let digital_span = (self.digital_max - self.digital_min) as f64;
        if digital_span <= 0.0 {
            return self.physical_min;
        }
        self.physical_min
            + (raw - self.digital_min as f64) * (self.physical_max - self.physical_min)
                / digital_span
    }
}

fn float_field(
    buffer: &[u8],
    offset: usize,
    len: usize,
    channel: usize,
    name: &str,
) -> Result<f64, EdfError> {
    let text = read_trimmed(buffer, offset, len);
    text.parse::<f64>().map_err(|_| {
        EdfError::MalformedCatalog(format!(
            "channel {channel}: {name} is not numeric: '{text}'"
        ))
    })
}

fn int_field(
    buffer: &[u8],
    offset: usize,
    len: usize,
    channel: usize,
    name: &str,
) -> Result<i64, EdfError> {
    let text = read_trimmed(buffer, offset, len);
    text.parse::<i64>().map_err(|_| {
        EdfError::MalformedCatalog(format!(
            "channel {channel}: {name} is not numeric: '{text}'"
        ))
    })
}

/// Decode the per-channel calibration blocks that follow the primary header.
pub fn decode_channels(
    buffer: &[u8],
    channel_count: usize,
) -> Result<Vec<ChannelDescriptor>, EdfError> {
    let needed = PRIMARY_HEADER_LEN + CALIBRATION_BLOCK_LEN * channel_count;
    if buffer.len() < needed {
        return Err(EdfError::MalformedCatalog(format!(
            "buffer holds {} bytes, {} channels need {}",
            buffer.len(),
            channel_count,
            needed
        )));
    }
    let mut channels = Vec::with_capacity(channel_count);
    for i in 0..channel_count {
        let offset = PRIMARY_HEADER_LEN + i * CALIBRATION_BLOCK_LEN;
        let label = read_trimmed(buffer, offset, 16);
        let transducer = read_trimmed(buffer, offset + 16, 80);
        let physical_unit = read_trimmed(buffer, offset + 96, 8);
        let physical_min = float_field(buffer, offset + 104, 8, i, "physical minimum")?;
        let physical_max = float_field(buffer, offset + 112, 8, i, "physical maximum")?;
        let digital_min = int_field(buffer, offset + 120, 8, i, "digital minimum")?;
        let digital_max = int_field(buffer, offset + 128, 8, i, "digital maximum")?;
        let prefiltering = read_trimmed(buffer, offset + 136, 80);

        // One malformed samples-per-record field must not abort the catalog.
        let samples_text = read_trimmed(buffer, offset + 216, 8);
        let samples_per_record = match samples_text.parse::<i64>() {
            Ok(value) if value >= 0 => value as usize,
            _ => {
                warn!(
                    "channel {} ('{}'): samples-per-record '{}' is not a non-negative integer, substituting 0",
                    i, label, samples_text
                );
                0
            }
        };

        let encoding = SampleEncoding::from_tag(&read_trimmed(buffer, offset + 224, 32))?;

        if digital_max <= digital_min {
            warn!(
                "channel {} ('{}'): digital range [{}, {}] leaves the rescale undefined",
                i, label, digital_min, digital_max
            );
        }
        if physical_max <= physical_min {
            warn!(
                "channel {} ('{}'): physical range [{}, {}] leaves the rescale undefined",
                i, label, physical_min, physical_max
            );
        }

        channels.push(ChannelDescriptor {
            label,
            transducer,
            physical_unit,
            physical_min,
            physical_max,
            digital_min,
            digital_max,
            prefiltering,
            samples_per_record,
            encoding,
        });
    }
    Ok(channels)
}
