//! Canonical naming of flat interval sequences.
//!
//! The namer knows nothing about parsed structures, so the same rules name
//! both planned workouts and raw recorded ones. Strategies run in order
//! and the first one that recognizes the sequence wins; more specific
//! names (exact repeat counts, chunked patterns) come before vaguer shape
//! descriptions.

use crate::{format_clock, FlatInterval, IntervalType};

/// Distances treated as identical within this many meters
pub const DISTANCE_TOLERANCE: u32 = 5;
/// Times treated as identical within this many deciseconds
pub const TIME_TOLERANCE: u32 = 10;
pub const CALORIE_TOLERANCE: u32 = 2;
pub const WATTS_TOLERANCE: u32 = 5;

/// A block's closing rest must exceed its internal rest by this factor
const BLOCK_REST_RATIO: f64 = 1.5;

/// Longest sequence still listed piece by piece
const MAX_LISTED_INTERVALS: usize = 16;

const STANDARD_DISTANCES: [u32; 13] = [
    100, 250, 500, 1000, 1500, 2000, 3000, 5000, 6000, 10000, 15000, 21097, 42195,
];

/// 20, 30, 40 and 60 minutes in deciseconds
const STANDARD_TIMES: [u32; 4] = [12000, 18000, 24000, 36000];

type Strategy = fn(&[FlatInterval]) -> Option<String>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("single", single_interval),
    ("block_rest_pattern", block_rest_pattern),
    ("uniform", uniform_work),
    ("chunk_repeat", chunk_repeat),
    ("pyramid", pyramid),
    ("ladder", ladder),
    ("uniform_energy", uniform_energy),
    ("variable_list", variable_list),
];

/// Compute the canonical display name for a sequence of intervals
pub fn canonical_name(intervals: &[FlatInterval]) -> String {
    if intervals.is_empty() {
        return "Unknown".into();
    }

    let work: Vec<FlatInterval> = intervals.iter().filter(|i| !i.is_rest()).cloned().collect();
    if work.is_empty() {
        return "Rest Only".into();
    }

    STRATEGIES
        .iter()
        .find_map(|(label, strategy)| {
            strategy(&work).inspect(|name| {
                tracing::debug!("Named {} intervals via {}: {}", work.len(), label, name)
            })
        })
        .unwrap_or_else(|| "Unstructured".into())
}

// ============================================================================
// Classification helpers
// ============================================================================

/// What a work interval is measured by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkKind {
    Distance,
    Time,
    Calories,
}

/// Explicit type first, then whichever of distance/time is set. When both
/// are set, a standard test time reads as time, anything else as distance.
pub fn classify(interval: &FlatInterval) -> WorkKind {
    match interval.kind {
        Some(IntervalType::Distance) => WorkKind::Distance,
        Some(IntervalType::Time) => WorkKind::Time,
        Some(IntervalType::Calories) => WorkKind::Calories,
        Some(IntervalType::Rest) | None => match (interval.distance > 0, interval.time > 0) {
            (true, false) => WorkKind::Distance,
            (false, true) => WorkKind::Time,
            (true, true) if is_standard_time(interval.time) => WorkKind::Time,
            (true, true) => WorkKind::Distance,
            (false, false) if interval.calories_total > 0 => WorkKind::Calories,
            (false, false) => WorkKind::Distance,
        },
    }
}

fn is_standard_time(deciseconds: u32) -> bool {
    STANDARD_TIMES.iter().any(|&t| t.abs_diff(deciseconds) <= TIME_TOLERANCE)
}

/// The measured value for a kind: meters, deciseconds or calories
pub fn value_of(interval: &FlatInterval, kind: WorkKind) -> u32 {
    match kind {
        WorkKind::Distance => interval.distance,
        WorkKind::Time => interval.time,
        WorkKind::Calories => interval.calories_total,
    }
}

pub fn tolerance_of(kind: WorkKind) -> u32 {
    match kind {
        WorkKind::Distance => DISTANCE_TOLERANCE,
        WorkKind::Time => TIME_TOLERANCE,
        WorkKind::Calories => CALORIE_TOLERANCE,
    }
}

fn close(a: u32, b: u32, tolerance: u32) -> bool {
    a.abs_diff(b) <= tolerance
}

/// `m:ss` for a deciseconds value, rounded to the nearest second
pub fn clock(deciseconds: u32) -> String {
    format_clock(deciseconds.saturating_add(5) / 10)
}

/// Per-interval signature: `500m`, `4:00` or `20cal`
pub fn signature(interval: &FlatInterval) -> String {
    render_as(interval, classify(interval))
}

fn rest_suffix(deciseconds: u32) -> String {
    if deciseconds == 0 {
        String::new()
    } else {
        format!("/{}r", clock(deciseconds))
    }
}

/// Snap to the nearest standard rowing distance within max(20m, 1%)
pub fn snap_distance(meters: u32) -> u32 {
    STANDARD_DISTANCES
        .iter()
        .copied()
        .filter(|&d| d.abs_diff(meters) <= (d / 100).max(20))
        .min_by_key(|&d| d.abs_diff(meters))
        .unwrap_or(meters)
}

/// All intervals share one kind (distance or time only)
fn common_kind(intervals: &[FlatInterval]) -> Option<WorkKind> {
    let kind = classify(intervals.first()?);
    if kind == WorkKind::Calories {
        return None;
    }
    intervals.iter().all(|i| classify(i) == kind).then_some(kind)
}

/// Whether an interval can be read as measured by `kind`. An explicit type
/// settles it; an untyped interval qualifies on any nonzero field.
pub fn measures(interval: &FlatInterval, kind: WorkKind) -> bool {
    match interval.kind {
        Some(IntervalType::Distance) => kind == WorkKind::Distance,
        Some(IntervalType::Time) => kind == WorkKind::Time,
        Some(IntervalType::Calories) => kind == WorkKind::Calories,
        Some(IntervalType::Rest) | None => value_of(interval, kind) > 0,
    }
}

/// Uniform distance, else uniform time, read from whichever field each
/// interval supports
pub fn uniform_measure(intervals: &[FlatInterval]) -> Option<WorkKind> {
    let first = intervals.first()?;
    [WorkKind::Distance, WorkKind::Time].into_iter().find(|&kind| {
        let reference = value_of(first, kind);
        intervals
            .iter()
            .all(|i| measures(i, kind) && close(value_of(i, kind), reference, tolerance_of(kind)))
    })
}

/// `500m`, `4:00` or `20cal` for an interval read as `kind`
fn render_as(interval: &FlatInterval, kind: WorkKind) -> String {
    match kind {
        WorkKind::Distance => format!("{}m", interval.distance),
        WorkKind::Time => clock(interval.time),
        WorkKind::Calories => format!("{}cal", interval.calories_total),
    }
}

/// All intervals share one kind and the same value within tolerance
pub fn uniform_kind(intervals: &[FlatInterval]) -> Option<WorkKind> {
    let first = intervals.first()?;
    let kind = classify(first);
    let reference = value_of(first, kind);
    intervals
        .iter()
        .all(|i| classify(i) == kind && close(value_of(i, kind), reference, tolerance_of(kind)))
        .then_some(kind)
}

// ============================================================================
// Strategies
// ============================================================================

fn single_interval(intervals: &[FlatInterval]) -> Option<String> {
    let [only] = intervals else {
        return None;
    };

    Some(match classify(only) {
        WorkKind::Distance => format!("{}m", snap_distance(only.distance)),
        WorkKind::Time => clock(only.time),
        WorkKind::Calories => format!("{}cal", only.calories_total),
    })
}

/// Uniform work split into equal blocks by a longer rest: `3x4x500m`
fn block_rest_pattern(intervals: &[FlatInterval]) -> Option<String> {
    let n = intervals.len();
    if n < 4 {
        return None;
    }
    let kind = uniform_measure(intervals).or_else(|| uniform_kind(intervals))?;

    for size in 2..=n / 2 {
        if n % size != 0 {
            continue;
        }

        let internal = intervals[0].rest_time;
        let boundary = intervals[size - 1].rest_time;
        if f64::from(boundary) <= f64::from(internal) * BLOCK_REST_RATIO {
            continue;
        }

        // The final interval may have no recorded rest at all
        let periodic = intervals[..n - 1].iter().enumerate().all(|(i, interval)| {
            let expected = if (i + 1) % size == 0 { boundary } else { internal };
            close(interval.rest_time, expected, TIME_TOLERANCE)
        });

        if periodic {
            return Some(format!(
                "{}x{}x{}",
                n / size,
                size,
                render_as(&intervals[0], kind)
            ));
        }
    }

    None
}

/// Same distance or time throughout: `4x500m/1:00r`
fn uniform_work(intervals: &[FlatInterval]) -> Option<String> {
    let kind = uniform_measure(intervals)?;
    let first = &intervals[0];
    Some(format!(
        "{}x{}{}",
        intervals.len(),
        render_as(first, kind),
        rest_suffix(first.rest_time)
    ))
}

/// A repeated chunk of differing pieces: `3x 750m/500m/250m/3:00r`
fn chunk_repeat(intervals: &[FlatInterval]) -> Option<String> {
    // All-calorie runs are left to the energy strategy
    if intervals.iter().all(|i| classify(i) == WorkKind::Calories) {
        return None;
    }

    let n = intervals.len();
    let signatures: Vec<String> = intervals.iter().map(signature).collect();

    (2..=n / 2)
        .filter(|k| n % k == 0)
        .find(|&k| (k..n).all(|i| signatures[i] == signatures[i % k]))
        .map(|k| {
            format!(
                "{}x {}{}",
                n / k,
                signatures[..k].join("/"),
                rest_suffix(intervals[0].rest_time)
            )
        })
}

/// Symmetric rise and fall: `v500m... Pyramid`
fn pyramid(intervals: &[FlatInterval]) -> Option<String> {
    let n = intervals.len();
    if n < 5 {
        return None;
    }
    let kind = common_kind(intervals)?;

    let first = value_of(&intervals[0], kind);
    let last = value_of(&intervals[n - 1], kind);
    let middle = value_of(&intervals[n / 2], kind);

    (close(first, last, tolerance_of(kind)) && middle > first)
        .then(|| format!("v{}... Pyramid", signature(&intervals[0])))
}

/// Strictly monotonic: `v100...1000m Ladder`
fn ladder(intervals: &[FlatInterval]) -> Option<String> {
    let n = intervals.len();
    if n < 5 {
        return None;
    }
    let kind = common_kind(intervals)?;

    let values: Vec<u32> = intervals.iter().map(|i| value_of(i, kind)).collect();
    let ascending = values.windows(2).all(|w| w[1] > w[0]);
    let descending = values.windows(2).all(|w| w[1] < w[0]);
    if !ascending && !descending {
        return None;
    }

    let (first, last) = (values[0], values[n - 1]);
    Some(match kind {
        WorkKind::Time => format!("v{}...{} Ladder", clock(first), clock(last)),
        _ => format!("v{}...{}m Ladder", first, last),
    })
}

/// Equal calories or equal average watts across otherwise differing pieces
fn uniform_energy(intervals: &[FlatInterval]) -> Option<String> {
    let n = intervals.len();
    let first = &intervals[0];

    let calories = first.calories_total;
    if calories > 0
        && intervals
            .iter()
            .all(|i| i.calories_total > 0 && close(i.calories_total, calories, CALORIE_TOLERANCE))
    {
        return Some(format!("{}x{}cal", n, calories));
    }

    let watts = first.watts;
    if watts > 0
        && intervals
            .iter()
            .all(|i| i.watts > 0 && close(i.watts, watts, WATTS_TOLERANCE))
    {
        return Some(format!("{}x{}W", n, watts));
    }

    None
}

/// Short irregular sequences listed in full: `v500/1000/750m`
fn variable_list(intervals: &[FlatInterval]) -> Option<String> {
    if intervals.len() > MAX_LISTED_INTERVALS {
        return None;
    }

    let signatures: Vec<String> = intervals.iter().map(signature).collect();
    if signatures.iter().all(|s| s.ends_with('m')) {
        let bare: Vec<&str> = signatures.iter().map(|s| s.trim_end_matches('m')).collect();
        Some(format!("v{}m", bare.join("/")))
    } else {
        Some(format!("v{}", signatures.join("/")))
    }
}
