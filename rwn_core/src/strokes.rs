//! Rebuild intervals from a raw per-stroke series.
//!
//! Monitors reset elapsed time and distance at the start of each interval,
//! so a drop in either marks a boundary. This is the fallback when a
//! recording carries no explicit interval splits.

use crate::{FlatInterval, IntervalType};
use serde::{Deserialize, Serialize};

/// Whole-minute check tolerance, in deciseconds
const MINUTE_TOLERANCE: u32 = 10;
/// Round-hundred check tolerance, in meters
const HUNDRED_TOLERANCE: f64 = 3.0;

/// One stroke as recorded by the monitor
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StrokeSample {
    /// Deciseconds since the interval started
    pub time: u32,
    /// Meters since the interval started
    pub distance: f64,
    #[serde(default)]
    pub watts: Option<f64>,
}

/// Split a stroke series on time or distance resets
pub fn detect_intervals_from_strokes(strokes: &[StrokeSample]) -> Vec<FlatInterval> {
    let mut intervals = Vec::new();
    let mut start = 0;

    for i in 1..=strokes.len() {
        let boundary = match (strokes.get(i - 1), strokes.get(i)) {
            (Some(prev), Some(next)) => next.time < prev.time || next.distance < prev.distance,
            _ => true,
        };
        if boundary && start < i {
            if let Some(interval) = segment_interval(&strokes[start..i]) {
                intervals.push(interval);
            }
            start = i;
        }
    }

    tracing::debug!(
        "Split {} strokes into {} intervals",
        strokes.len(),
        intervals.len()
    );
    intervals
}

fn segment_interval(segment: &[StrokeSample]) -> Option<FlatInterval> {
    let last = segment.last()?;
    let distance = last.distance.max(0.0).round() as u32;
    if distance == 0 && last.time == 0 {
        return None;
    }

    let watts: Vec<f64> = segment.iter().filter_map(|s| s.watts).collect();
    let mean_watts = if watts.is_empty() {
        0
    } else {
        (watts.iter().sum::<f64>() / watts.len() as f64).round() as u32
    };

    Some(FlatInterval {
        kind: infer_type(last.time, last.distance),
        distance,
        time: last.time,
        watts: mean_watts,
        ..FlatInterval::default()
    })
}

/// Monitors stop exactly on the programmed target, so a round value on
/// one axis and not the other says which one it was.
fn infer_type(time: u32, distance: f64) -> Option<IntervalType> {
    let minute_offset = time % 600;
    let round_time = time > 0 && (minute_offset <= MINUTE_TOLERANCE || 600 - minute_offset <= MINUTE_TOLERANCE);

    let hundred_offset = distance.rem_euclid(100.0);
    let round_distance = distance >= 100.0 - HUNDRED_TOLERANCE
        && (hundred_offset <= HUNDRED_TOLERANCE || 100.0 - hundred_offset <= HUNDRED_TOLERANCE);

    match (round_time, round_distance) {
        (true, false) => Some(IntervalType::Time),
        (false, true) => Some(IntervalType::Distance),
        _ => None,
    }
}
