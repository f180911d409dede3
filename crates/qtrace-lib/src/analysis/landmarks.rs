use super::AnalysisError;
use crate::signal::TimeWindow;

/// Resolve a window to the index range of covered samples (closed on both
/// ends). A zero or negative span is empty by definition, as is a window
/// that no sample timestamp falls into.
pub(crate) fn window_bounds(
    points: &[[f64; 2]],
    window: TimeWindow,
) -> Result<(usize, usize), AnalysisError> {
    if window.end_ms <= window.start_ms {
        return Err(empty(window));
    }
    let mut first = None;
    let mut last = None;
    for (idx, point) in points.iter().enumerate() {
        if point[0] < window.start_ms {
            continue;
        }
        if point[0] > window.end_ms {
            break;
        }
        if first.is_none() {
            first = Some(idx);
        }
        last = Some(idx);
    }
    match (first, last) {
        (Some(first), Some(last)) => Ok((first, last)),
        _ => Err(empty(window)),
    }
}

fn empty(window: TimeWindow) -> AnalysisError {
    AnalysisError::EmptyWindow {
        start_ms: window.start_ms,
        end_ms: window.end_ms,
    }
}

/// R is the maximum-amplitude sample in `first..=last`; the first occurrence
/// wins ties on the ascending-time scan.
pub(crate) fn find_r_peak(points: &[[f64; 2]], first: usize, last: usize) -> usize {
    let mut peak = first;
    for idx in first..=last {
        if points[idx][1] > points[peak][1] {
            peak = idx;
        }
    }
    peak
}

/// Walk forward while the amplitude keeps falling. Starting at R, the last
/// still-falling sample is the first local minimum after the peak, which is
/// taken as the S landmark. Degrades to the start index when nothing falls.
pub(crate) fn descend_from(points: &[[f64; 2]], start: usize) -> usize {
    let mut idx = start;
    while idx + 1 < points.len() && points[idx + 1][1] < points[idx][1] {
        idx += 1;
    }
    idx
}

/// Walk backward while the amplitude keeps falling; the first local minimum
/// before the peak approximates the Q onset.
pub(crate) fn descend_back(points: &[[f64; 2]], start: usize) -> usize {
    let mut idx = start;
    while idx > 0 && points[idx - 1][1] < points[idx][1] {
        idx -= 1;
    }
    idx
}

/// Walk forward while the amplitude keeps rising.
pub(crate) fn ascend_from(points: &[[f64; 2]], start: usize) -> usize {
    let mut idx = start;
    while idx + 1 < points.len() && points[idx + 1][1] > points[idx][1] {
        idx += 1;
    }
    idx
}

/// T-wave end approximation: from the peak, descend to a trough, ascend to a
/// crest, descend again; the second trough is taken as T. An unvalidated
/// bedside heuristic; callers must not assume more precision than visual
/// review.
pub(crate) fn t_offset_from(points: &[[f64; 2]], peak: usize) -> usize {
    let first_trough = descend_from(points, peak);
    let crest = ascend_from(points, first_trough);
    descend_from(points, crest)
}
