pub mod intervals;
pub mod landmarks;

pub use intervals::{AnalysisReport, AnalyzedInterval, ChannelAnalyzer, QtcValues};

use thiserror::Error;

/// Analyzer failures. Both are recovered: the caller is notified and no
/// interval state mutates.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("window [{start_ms}, {end_ms}] contains no samples")]
    EmptyWindow { start_ms: f64, end_ms: f64 },
    #[error("no interval at index {0}")]
    IntervalOutOfRange(usize),
}
