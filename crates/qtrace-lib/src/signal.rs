use serde::{Deserialize, Serialize};

/// One decoded channel: calibrated samples as `[timestamp_ms, physical_value]`
/// pairs, strictly non-decreasing in time. Read-only after decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSamples {
    pub label: String,
    /// Physical dimension label from the calibration block (e.g. "mV").
    pub unit: String,
    pub points: Vec<[f64; 2]>,
}

impl ChannelSamples {
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn duration_ms(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last[0] - first[0],
            _ => 0.0,
        }
    }
}

/// Closed time window in milliseconds, as supplied by an interaction
/// collaborator (brush gesture, marked region).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl TimeWindow {
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn span_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }
}
