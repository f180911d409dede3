use serde::{Deserialize, Serialize};

/// Downsampling policy applied uniformly to every channel series before
/// rendering. Selection never touches the decoded sample buffers, only the
/// rendering-side copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingPolicy {
    Original,
    Max,
    Average,
    Min,
    Lttb,
}

impl SamplingPolicy {
    /// Coarse rank of how much waveform detail the policy retains. Higher
    /// ranks discard less.
    pub fn detail_rank(&self) -> u8 {
        match self {
            SamplingPolicy::Average => 0,
            SamplingPolicy::Min => 1,
            SamplingPolicy::Max => 2,
            SamplingPolicy::Lttb => 3,
            SamplingPolicy::Original => 4,
        }
    }
}

/// Map the visible span (percent of the full recording, 0..=100) to a
/// sampling policy. Bands descend from the aggressive decimators to lossless
/// as the user zooms in; the 50% boundary keeps full resolution for close
/// review. Shrinking the span never selects a lossier policy.
pub fn select_sampling(zoom_span_percent: f64) -> SamplingPolicy {
    if zoom_span_percent >= 95.0 {
        SamplingPolicy::Average
    } else if zoom_span_percent >= 85.0 {
        SamplingPolicy::Min
    } else if zoom_span_percent >= 70.0 {
        SamplingPolicy::Max
    } else if zoom_span_percent > 50.0 {
        SamplingPolicy::Lttb
    } else {
        SamplingPolicy::Original
    }
}

/// Reduce `points` to at most `max_points` under the policy. Series already
/// under the budget (and the `Original` policy) pass through untouched.
pub fn downsample(points: &[[f64; 2]], policy: SamplingPolicy, max_points: usize) -> Vec<[f64; 2]> {
    if max_points == 0 || points.len() <= max_points {
        return points.to_vec();
    }
    match policy {
        SamplingPolicy::Original => points.to_vec(),
        SamplingPolicy::Max => bucket_reduce(points, max_points, pick_max),
        SamplingPolicy::Min => bucket_reduce(points, max_points, pick_min),
        SamplingPolicy::Average => bucket_reduce(points, max_points, pick_average),
        SamplingPolicy::Lttb => lttb(points, max_points),
    }
}

fn bucket_reduce(
    points: &[[f64; 2]],
    max_points: usize,
    pick: fn(&[[f64; 2]]) -> [f64; 2],
) -> Vec<[f64; 2]> {
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut out = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        let end = (((i + 1) as f64) * bucket_size).floor() as usize;
        let end = end.max(start + 1).min(points.len());
        out.push(pick(&points[start..end]));
    }
    out
}

fn pick_max(bucket: &[[f64; 2]]) -> [f64; 2] {
    let mut best = bucket[0];
    for point in &bucket[1..] {
        if point[1] > best[1] {
            best = *point;
        }
    }
    best
}

fn pick_min(bucket: &[[f64; 2]]) -> [f64; 2] {
    let mut best = bucket[0];
    for point in &bucket[1..] {
        if point[1] < best[1] {
            best = *point;
        }
    }
    best
}

fn pick_average(bucket: &[[f64; 2]]) -> [f64; 2] {
    let mut x = 0.0;
    let mut y = 0.0;
    for point in bucket {
        x += point[0];
        y += point[1];
    }
    let count = bucket.len() as f64;
    [x / count, y / count]
}

/// Largest-triangle-three-buckets: keeps the point per bucket that spans the
/// largest triangle with the previous pick and the next bucket's centroid,
/// which preserves visual peak shape better than naive decimation.
fn lttb(points: &[[f64; 2]], threshold: usize) -> Vec<[f64; 2]> {
    if threshold < 3 || threshold >= points.len() {
        return points.to_vec();
    }
    let bucket_size = (points.len() - 2) as f64 / (threshold - 2) as f64;
    let mut out = Vec::with_capacity(threshold);
    out.push(points[0]);
    let mut anchor = 0usize;
    for bucket in 0..threshold - 2 {
        let start = (bucket as f64 * bucket_size).floor() as usize + 1;
        let end = ((((bucket + 1) as f64) * bucket_size).floor() as usize + 1).min(points.len() - 1);
        let next_end = ((((bucket + 2) as f64) * bucket_size).floor() as usize + 1).min(points.len());
        let next_slice = if end < next_end {
            &points[end..next_end]
        } else {
            &points[points.len() - 1..]
        };
        let [avg_x, avg_y] = pick_average(next_slice);

        let a = points[anchor];
        let mut best = start;
        let mut best_area = f64::MIN;
        for idx in start..end {
            let area = ((a[0] - avg_x) * (points[idx][1] - a[1])
                - (a[0] - points[idx][0]) * (avg_y - a[1]))
                .abs();
            if area > best_area {
                best_area = area;
                best = idx;
            }
        }
        out.push(points[best]);
        anchor = best;
    }
    out.push(points[points.len() - 1]);
    out
}
