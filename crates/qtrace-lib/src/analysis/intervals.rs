use super::landmarks::{descend_back, descend_from, find_r_peak, t_offset_from, window_bounds};
use super::AnalysisError;
use crate::signal::TimeWindow;
use serde::{Deserialize, Serialize};

/// Framingham linear correction coefficient. Fixed contract value, not a
/// tunable default.
const FRAMINGHAM_COEFF: f64 = 0.154;

/// Heart-rate-corrected QT values in milliseconds, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QtcValues {
    pub bazett: f64,
    pub framingham: f64,
    pub fridericia: f64,
}

/// One analyzed cardiac interval. `qtc` stays `None` until a following
/// interval exists to supply the next RR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedInterval {
    pub start_time: f64,
    pub end_time: f64,
    /// Time of the R landmark (ms).
    pub r: f64,
    /// Time of the S landmark (ms).
    pub s: f64,
    pub qtc: Option<QtcValues>,
}

/// Bulk query shape handed to interaction collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub intervals: Vec<AnalyzedInterval>,
    pub heart_rate: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn qtc_values(qt_ms: f64, rr_ms: f64) -> QtcValues {
    let qt = qt_ms / 1000.0;
    let rr = rr_ms / 1000.0;
    QtcValues {
        bazett: round2(qt / rr.sqrt() * 1000.0),
        framingham: round2((qt + FRAMINGHAM_COEFF * (1.0 - rr)) * 1000.0),
        fridericia: round2(qt / rr.cbrt() * 1000.0),
    }
}

/// Ordered interval bookkeeping for one channel. The channel's sample
/// sequence stays immutable; only this collection mutates, and only through
/// its own operations.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChannelAnalyzer {
    intervals: Vec<AnalyzedInterval>,
}

impl ChannelAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brush variant: locate R/S inside the caller's window; the interval
    /// spans the window's covered samples.
    pub fn analyze_window(
        &mut self,
        points: &[[f64; 2]],
        window: TimeWindow,
    ) -> Result<AnalyzedInterval, AnalysisError> {
        let (first, last) = window_bounds(points, window)?;
        let r_idx = find_r_peak(points, first, last);
        let s_idx = descend_from(points, r_idx);
        let interval = AnalyzedInterval {
            start_time: points[first][0],
            end_time: points[last][0],
            r: points[r_idx][0],
            s: points[s_idx][0],
            qtc: None,
        };
        self.insert(interval.clone());
        Ok(interval)
    }

    /// Single-landmark variant: derive the Q..T approximation around the
    /// window's dominant peak and span the interval across it.
    pub fn mark_qt_interval(
        &mut self,
        points: &[[f64; 2]],
        window: TimeWindow,
    ) -> Result<AnalyzedInterval, AnalysisError> {
        let (first, last) = window_bounds(points, window)?;
        let r_idx = find_r_peak(points, first, last);
        let s_idx = descend_from(points, r_idx);
        let q_idx = descend_back(points, r_idx);
        let t_idx = t_offset_from(points, r_idx);
        let interval = AnalyzedInterval {
            start_time: points[q_idx][0],
            end_time: points[t_idx][0],
            r: points[r_idx][0],
            s: points[s_idx][0],
            qtc: None,
        };
        self.insert(interval.clone());
        Ok(interval)
    }

    fn insert(&mut self, interval: AnalyzedInterval) {
        self.intervals.push(interval);
        self.intervals
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        self.recompute_qtc();
    }

    /// QTc depends on neighbor adjacency, so the whole collection recomputes
    /// after every insertion or removal. For each consecutive pair the
    /// earlier interval supplies QT, the R-to-R distance supplies RR, and
    /// the corrected values land on the later interval.
    fn recompute_qtc(&mut self) {
        for interval in &mut self.intervals {
            interval.qtc = None;
        }
        for i in 0..self.intervals.len().saturating_sub(1) {
            let qt = self.intervals[i].end_time - self.intervals[i].start_time;
            let rr = self.intervals[i + 1].r - self.intervals[i].r;
            self.intervals[i + 1].qtc = Some(qtc_values(qt, rr));
        }
    }

    /// Remove the interval at `index` and recompute the survivors' QTc.
    pub fn remove(&mut self, index: usize) -> Result<AnalyzedInterval, AnalysisError> {
        if index >= self.intervals.len() {
            return Err(AnalysisError::IntervalOutOfRange(index));
        }
        let removed = self.intervals.remove(index);
        self.recompute_qtc();
        Ok(removed)
    }

    /// The channel's intervals, sorted by start time ascending.
    pub fn intervals(&self) -> &[AnalyzedInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Mean of successive R-to-R differences, as beats per minute. Reported
    /// as 0 (undefined) until two intervals exist.
    pub fn heart_rate(&self) -> f64 {
        if self.intervals.len() < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        for pair in self.intervals.windows(2) {
            sum += pair[1].r - pair[0].r;
        }
        let mean_rr = sum / (self.intervals.len() - 1) as f64;
        if mean_rr <= 0.0 {
            return 0.0;
        }
        round2(60_000.0 / mean_rr)
    }

    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            intervals: self.intervals.clone(),
            heart_rate: self.heart_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: f64, end: f64, r: f64) -> AnalyzedInterval {
        AnalyzedInterval {
            start_time: start,
            end_time: end,
            r,
            s: r + 20.0,
            qtc: None,
        }
    }

    fn analyzer_with(intervals: Vec<AnalyzedInterval>) -> ChannelAnalyzer {
        let mut analyzer = ChannelAnalyzer::new();
        for entry in intervals {
            analyzer.insert(entry);
        }
        analyzer
    }

    /// A flat trace with one triangular beat centered on each requested time.
    fn beat_series(beat_times_ms: &[f64], step_ms: f64, total_ms: f64) -> Vec<[f64; 2]> {
        let count = (total_ms / step_ms) as usize;
        (0..count)
            .map(|idx| {
                let t = idx as f64 * step_ms;
                let mut v = 0.0;
                for &beat in beat_times_ms {
                    let distance = (t - beat).abs();
                    if distance < 40.0 {
                        v += 1.5 * (1.0 - distance / 40.0);
                    }
                }
                [t, v]
            })
            .collect()
    }

    #[test]
    fn qtc_scenario_rr_800_qt_360() {
        let analyzer = analyzer_with(vec![
            interval(40.0, 400.0, 100.0),
            interval(840.0, 1200.0, 900.0),
        ]);
        let intervals = analyzer.intervals();
        assert_eq!(intervals[0].qtc, None);
        let qtc = intervals[1].qtc.expect("second interval has QTc");
        assert_eq!(qtc.bazett, 402.49);
        assert_eq!(qtc.framingham, 390.8);
        assert_eq!(qtc.fridericia, 387.8);
    }

    #[test]
    fn heart_rate_from_mean_rr() {
        let analyzer = analyzer_with(vec![
            interval(0.0, 300.0, 100.0),
            interval(800.0, 1100.0, 900.0),
            interval(1600.0, 1900.0, 1700.0),
        ]);
        // mean RR = 800 ms -> 75 bpm
        assert_eq!(analyzer.heart_rate(), 75.0);
    }

    #[test]
    fn heart_rate_undefined_below_two_intervals() {
        let analyzer = analyzer_with(vec![interval(0.0, 300.0, 100.0)]);
        assert_eq!(analyzer.heart_rate(), 0.0);
        assert_eq!(ChannelAnalyzer::new().heart_rate(), 0.0);
    }

    #[test]
    fn insertions_keep_start_time_order() {
        let analyzer = analyzer_with(vec![
            interval(1600.0, 1900.0, 1700.0),
            interval(0.0, 300.0, 100.0),
            interval(800.0, 1100.0, 900.0),
        ]);
        let starts: Vec<f64> = analyzer
            .intervals()
            .iter()
            .map(|entry| entry.start_time)
            .collect();
        assert_eq!(starts, vec![0.0, 800.0, 1600.0]);
    }

    #[test]
    fn removal_recomputes_neighbor_qtc() {
        let mut analyzer = analyzer_with(vec![
            interval(40.0, 400.0, 100.0),
            interval(840.0, 1200.0, 900.0),
            interval(1640.0, 2000.0, 1700.0),
        ]);
        let before = analyzer.intervals()[2].qtc.expect("third has QTc");
        analyzer.remove(1).expect("remove middle");
        assert_eq!(analyzer.len(), 2);
        assert_eq!(analyzer.intervals()[0].qtc, None);
        let after = analyzer.intervals()[1].qtc.expect("survivor has QTc");
        // RR doubled from 800 to 1600, so every corrected value moved
        assert_ne!(before, after);
        assert_eq!(after.bazett, round2(0.36 / 1.6f64.sqrt() * 1000.0));
    }

    #[test]
    fn remove_out_of_range_reports_error() {
        let mut analyzer = analyzer_with(vec![interval(0.0, 300.0, 100.0)]);
        assert_eq!(
            analyzer.remove(3),
            Err(AnalysisError::IntervalOutOfRange(3))
        );
        assert_eq!(analyzer.len(), 1);
    }

    #[test]
    fn bazett_decreases_as_rr_grows_for_fixed_qt() {
        let mut previous = f64::MAX;
        for rr in [600.0, 800.0, 1000.0, 1200.0] {
            let qtc = qtc_values(360.0, rr);
            assert!(qtc.bazett < previous);
            previous = qtc.bazett;
        }
    }

    #[test]
    fn all_formulas_increase_with_qt_for_fixed_rr() {
        let mut previous = qtc_values(300.0, 800.0);
        for qt in [340.0, 380.0, 420.0] {
            let qtc = qtc_values(qt, 800.0);
            assert!(qtc.bazett > previous.bazett);
            assert!(qtc.framingham > previous.framingham);
            assert!(qtc.fridericia > previous.fridericia);
            previous = qtc;
        }
    }

    #[test]
    fn analyze_window_locates_r_and_s_on_a_synthetic_beat() {
        let points = beat_series(&[100.0, 900.0], 10.0, 2000.0);
        let mut analyzer = ChannelAnalyzer::new();
        let first = analyzer
            .analyze_window(&points, TimeWindow::new(40.0, 400.0))
            .expect("first window");
        assert_eq!(first.r, 100.0);
        assert!(first.s > first.r);
        let second = analyzer
            .analyze_window(&points, TimeWindow::new(840.0, 1200.0))
            .expect("second window");
        assert_eq!(second.r, 900.0);
        assert_eq!(analyzer.len(), 2);
        assert!(analyzer.intervals()[1].qtc.is_some());
        assert_eq!(analyzer.heart_rate(), 75.0);
    }

    #[test]
    fn empty_window_leaves_the_collection_unchanged() {
        let points = beat_series(&[100.0], 10.0, 500.0);
        let mut analyzer = ChannelAnalyzer::new();
        analyzer
            .analyze_window(&points, TimeWindow::new(40.0, 400.0))
            .expect("valid window");
        let before = analyzer.intervals().to_vec();
        let err = analyzer
            .analyze_window(&points, TimeWindow::new(500.0, 500.0))
            .expect_err("zero-span window");
        assert!(matches!(err, AnalysisError::EmptyWindow { .. }));
        assert_eq!(analyzer.intervals(), &before[..]);
    }

    #[test]
    fn mark_qt_interval_spans_q_to_t() {
        // beat at 300 ms with an adjacent T bump cresting at 420 ms
        let mut points = beat_series(&[300.0], 10.0, 800.0);
        for point in points.iter_mut() {
            let distance = (point[0] - 420.0).abs();
            if distance < 80.0 {
                point[1] += 0.5 * (1.0 - distance / 80.0);
            }
        }
        let mut analyzer = ChannelAnalyzer::new();
        let marked = analyzer
            .mark_qt_interval(&points, TimeWindow::new(200.0, 600.0))
            .expect("marked interval");
        assert_eq!(marked.r, 300.0);
        assert!(marked.start_time < marked.r, "Q precedes R");
        assert!(marked.end_time > marked.s, "T follows S");
        assert_eq!(marked.end_time, 500.0, "T is the trough past the bump");
    }
}
