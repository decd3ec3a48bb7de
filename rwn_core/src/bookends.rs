//! Warmup and cooldown detection over recorded intervals.
//!
//! Two families of layouts are tried, each with a warmup only, a cooldown
//! only, or both:
//!
//! - a bookend around a uniform main block of two or more pieces
//! - a bookend around a single standard test piece (2000m, 30:00, ...)
//!
//! Every layout that fits is kept; the winner is the one with both
//! bookends, then the one with the larger main block.

use crate::naming::{
    canonical_name, classify, measures, tolerance_of, uniform_measure, value_of, WorkKind,
};
use crate::{DetectionResult, FlatInterval};
use std::cmp::Reverse;
use std::ops::Range;

const TEST_DISTANCE_TOLERANCE: u32 = 10;
const TEST_TIME_TOLERANCE: u32 = 10;

const TEST_DISTANCES: [u32; 8] = [500, 1000, 2000, 5000, 6000, 10000, 21097, 42195];

/// 1, 4, 20, 30, 45 and 60 minutes in deciseconds. Five and ten minutes
/// are left out because they are common bookends themselves.
const TEST_TIMES: [u32; 6] = [600, 2400, 12000, 18000, 27000, 36000];

/// Which ends of the work sequence are claimed as bookends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Layout {
    warmup: bool,
    cooldown: bool,
}

const LAYOUTS: [Layout; 3] = [
    Layout {
        warmup: true,
        cooldown: false,
    },
    Layout {
        warmup: false,
        cooldown: true,
    },
    Layout {
        warmup: true,
        cooldown: true,
    },
];

impl Layout {
    fn main_range(&self, len: usize) -> Option<Range<usize>> {
        let start = usize::from(self.warmup);
        let end = len.checked_sub(usize::from(self.cooldown))?;
        (start < end).then_some(start..end)
    }

    fn bookends<'a>(&self, work: &[&'a FlatInterval]) -> Vec<&'a FlatInterval> {
        let mut out = Vec::new();
        if self.warmup {
            out.extend(work.first().copied());
        }
        if self.cooldown {
            out.extend(work.last().copied());
        }
        out
    }
}

type Strategy = fn(&[&FlatInterval], Layout) -> bool;

const STRATEGIES: [(&str, Strategy); 2] = [
    ("uniform_middle", uniform_middle),
    ("standard_piece", standard_piece),
];

/// Find warmup and cooldown pieces around a recognizable main set.
///
/// Explicit rest intervals are skipped; all reported indices refer to the
/// caller's slice.
pub fn detect_warmup_cooldown(intervals: &[FlatInterval]) -> DetectionResult {
    let work: Vec<(usize, &FlatInterval)> = intervals
        .iter()
        .enumerate()
        .filter(|(_, i)| !i.is_rest())
        .collect();
    let values: Vec<&FlatInterval> = work.iter().map(|(_, i)| *i).collect();

    let mut matches: Vec<(Layout, Range<usize>)> = Vec::new();
    for (label, strategy) in STRATEGIES {
        for layout in LAYOUTS {
            let Some(range) = layout.main_range(values.len()) else {
                continue;
            };
            if strategy(&values, layout) {
                tracing::debug!("Bookend strategy {} matched {:?}", label, layout);
                matches.push((layout, range));
            }
        }
    }

    // First best wins: both bookends, then the larger main block
    let best = matches
        .into_iter()
        .min_by_key(|(layout, range)| (Reverse(layout.warmup && layout.cooldown), Reverse(range.len())));

    match best {
        Some((layout, range)) => build_result(&work, layout, range),
        None => no_detection(&work),
    }
}

fn differs(bookend: &FlatInterval, kind: WorkKind, reference: u32, tolerance: u32) -> bool {
    !measures(bookend, kind) || value_of(bookend, kind).abs_diff(reference) > tolerance
}

/// Two or more uniform distance or time pieces between the bookends
fn uniform_middle(work: &[&FlatInterval], layout: Layout) -> bool {
    let Some(range) = layout.main_range(work.len()) else {
        return false;
    };
    if range.len() < 2 {
        return false;
    }

    let main: Vec<FlatInterval> = work[range].iter().map(|i| (*i).clone()).collect();
    let Some(kind) = uniform_measure(&main) else {
        return false;
    };
    let reference = value_of(&main[0], kind);

    layout
        .bookends(work)
        .iter()
        .all(|b| differs(b, kind, reference, tolerance_of(kind)))
}

/// A single standard test piece between the bookends
fn standard_piece(work: &[&FlatInterval], layout: Layout) -> bool {
    let Some(range) = layout.main_range(work.len()) else {
        return false;
    };
    if range.len() != 1 {
        return false;
    }

    let main = work[range.start];
    let kind = classify(main);
    let reference = value_of(main, kind);
    let standard = match kind {
        WorkKind::Distance => TEST_DISTANCES
            .iter()
            .any(|d| d.abs_diff(reference) <= TEST_DISTANCE_TOLERANCE),
        WorkKind::Time => TEST_TIMES
            .iter()
            .any(|t| t.abs_diff(reference) <= TEST_TIME_TOLERANCE),
        WorkKind::Calories => false,
    };

    standard
        && layout
            .bookends(work)
            .iter()
            .all(|b| differs(b, kind, reference, tolerance_of(kind)))
}

fn build_result(
    work: &[(usize, &FlatInterval)],
    layout: Layout,
    range: Range<usize>,
) -> DetectionResult {
    let main: Vec<FlatInterval> = work[range.clone()].iter().map(|(_, i)| (*i).clone()).collect();
    let main_name = canonical_name(&main);

    let warmup = if layout.warmup { work.first() } else { None };
    let cooldown = if layout.cooldown { work.last() } else { None };
    let name_of = |entry: &(usize, &FlatInterval)| canonical_name(std::slice::from_ref(entry.1));

    let mut parts = Vec::new();
    if let Some(entry) = warmup {
        parts.push(format!("[w]{}", name_of(entry)));
    }
    parts.push(main_name.clone());
    if let Some(entry) = cooldown {
        parts.push(format!("[c]{}", name_of(entry)));
    }

    let description = match (warmup, cooldown) {
        (Some(w), Some(c)) => format!(
            "Warmup {} and cooldown {} around {}",
            name_of(w),
            name_of(c),
            main_name
        ),
        (Some(w), None) => format!("Warmup {} before {}", name_of(w), main_name),
        (None, Some(c)) => format!("Cooldown {} after {}", name_of(c), main_name),
        (None, None) => main_name.clone(),
    };

    DetectionResult {
        detected: true,
        warmup_indices: warmup.map(|(idx, _)| vec![*idx]).unwrap_or_default(),
        cooldown_indices: cooldown.map(|(idx, _)| vec![*idx]).unwrap_or_default(),
        main_indices: work[range].iter().map(|(idx, _)| *idx).collect(),
        main_canonical_name: main_name,
        suggested_rwn: parts.join(" + "),
        description,
    }
}

fn no_detection(work: &[(usize, &FlatInterval)]) -> DetectionResult {
    let all: Vec<FlatInterval> = work.iter().map(|(_, i)| (*i).clone()).collect();
    DetectionResult {
        detected: false,
        main_indices: work.iter().map(|(idx, _)| *idx).collect(),
        main_canonical_name: canonical_name(&all),
        description: "No warmup or cooldown detected".into(),
        ..DetectionResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_session() -> Vec<FlatInterval> {
        vec![
            FlatInterval::time(6000),
            FlatInterval::distance(500).with_rest(600),
            FlatInterval::distance(500).with_rest(600),
            FlatInterval::distance(500).with_rest(600),
            FlatInterval::distance(500),
            FlatInterval::time(3000),
        ]
    }

    #[test]
    fn test_warmup_and_cooldown_around_uniform_set() {
        crate::logging::init_test();
        let result = detect_warmup_cooldown(&example_session());

        assert!(result.detected);
        assert_eq!(result.warmup_indices, vec![0]);
        assert_eq!(result.cooldown_indices, vec![5]);
        assert_eq!(result.main_indices, vec![1, 2, 3, 4]);
        assert_eq!(result.main_canonical_name, "4x500m/1:00r");
        assert_eq!(result.suggested_rwn, "[w]10:00 + 4x500m/1:00r + [c]5:00");
    }

    #[test]
    fn test_indices_skip_rest_intervals() {
        let mut intervals = example_session();
        intervals.insert(1, FlatInterval::rest(1200));
        let result = detect_warmup_cooldown(&intervals);

        assert!(result.detected);
        assert_eq!(result.warmup_indices, vec![0]);
        assert_eq!(result.main_indices, vec![2, 3, 4, 5]);
        assert_eq!(result.cooldown_indices, vec![6]);
    }

    #[test]
    fn test_warmup_only() {
        let intervals = vec![
            FlatInterval::distance(2000),
            FlatInterval::time(2400).with_rest(1200),
            FlatInterval::time(2400).with_rest(1200),
            FlatInterval::time(2400),
        ];
        let result = detect_warmup_cooldown(&intervals);

        assert!(result.detected);
        assert_eq!(result.warmup_indices, vec![0]);
        assert!(result.cooldown_indices.is_empty());
        assert_eq!(result.suggested_rwn, "[w]2000m + 3x4:00/2:00r");
    }

    #[test]
    fn test_standard_test_piece_with_bookends() {
        let intervals = vec![
            FlatInterval::time(12000),
            FlatInterval::distance(500),
            FlatInterval::time(6000),
        ];
        let result = detect_warmup_cooldown(&intervals);

        assert!(result.detected);
        assert_eq!(result.main_indices, vec![1]);
        assert_eq!(result.suggested_rwn, "[w]20:00 + 500m + [c]10:00");
    }

    #[test]
    fn test_common_bookend_length_is_not_a_test_piece() {
        let intervals = vec![FlatInterval::distance(2000), FlatInterval::time(6000)];
        let result = detect_warmup_cooldown(&intervals);

        // 10:00 is not a standard test time, so only the 2000m can be main
        assert!(result.detected);
        assert_eq!(result.main_indices, vec![0]);
        assert_eq!(result.cooldown_indices, vec![1]);
    }

    #[test]
    fn test_no_false_positive_on_uniform_workouts() {
        let eight = vec![FlatInterval::distance(500).with_rest(600); 8];
        let result = detect_warmup_cooldown(&eight);
        assert!(!result.detected);
        assert_eq!(result.main_indices, (0..8).collect::<Vec<_>>());
        assert_eq!(result.suggested_rwn, "");

        let three = vec![FlatInterval::time(6000); 3];
        assert!(!detect_warmup_cooldown(&three).detected);
    }

    #[test]
    fn test_identical_looking_bookend_is_rejected() {
        let intervals = vec![
            FlatInterval::distance(503),
            FlatInterval::distance(500),
            FlatInterval::distance(500),
        ];
        assert!(!detect_warmup_cooldown(&intervals).detected);
    }

    #[test]
    fn test_empty_input() {
        let result = detect_warmup_cooldown(&[]);
        assert!(!result.detected);
        assert_eq!(result.main_canonical_name, "Unknown");
    }

    #[test]
    fn test_untyped_uniform_time_middle() {
        let untyped = |distance, time| FlatInterval {
            distance,
            time,
            rest_time: 1200,
            ..FlatInterval::default()
        };
        let intervals = vec![
            untyped(1800, 6000),
            untyped(1710, 4200),
            untyped(1745, 4200),
            untyped(1690, 4200),
        ];
        let result = detect_warmup_cooldown(&intervals);

        assert!(result.detected);
        assert_eq!(result.warmup_indices, vec![0]);
        assert_eq!(result.main_indices, vec![1, 2, 3]);
        assert_eq!(result.main_canonical_name, "3x7:00/2:00r");
    }

    #[test]
    fn test_huge_values_do_not_panic() {
        let intervals = vec![
            FlatInterval::time(u32::MAX),
            FlatInterval::distance(500).with_rest(u32::MAX),
            FlatInterval::distance(500).with_rest(u32::MAX),
        ];
        let result = detect_warmup_cooldown(&intervals);
        assert!(result.detected);
        assert_eq!(result.main_indices, vec![1, 2]);
    }
}
