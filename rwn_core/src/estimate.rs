//! Duration and distance estimates for planned workouts.

use crate::{DurationType, Guidance, PaceTarget, Parser, WorkoutStructure};
use serde::{Deserialize, Serialize};

/// Fallback split when the caller's default pace is unusable
pub const FALLBACK_PACE_SECONDS: f64 = 120.0;

/// How the work time was arrived at
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMethod {
    /// Every work step was time-based
    Exact,
    /// Distance steps used their own absolute pace targets
    TargetPace,
    /// Distance steps used the default pace
    DefaultPace,
    Mixed,
    /// Work was present but none of it could be converted to time
    Unresolved,
}

/// Totals for a workout; times in seconds, distances in meters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DurationEstimate {
    pub work_distance: u32,
    pub work_time: u32,
    pub rest_time: u32,
    pub total_time: u32,
    pub estimate_method: EstimateMethod,
    /// Seconds per 500m, when every converted step used the same pace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_used: Option<f64>,
    /// Calorie work or zone/relative guidance could not be resolved
    pub requires_baseline: bool,
}

/// Parse and estimate in one step; `None` when the notation is unparsable
pub fn estimate_duration(text: &str, default_pace_seconds_per_500m: f64) -> Option<DurationEstimate> {
    let structure = Parser::default().parse(text)?;
    Some(estimate_structure(&structure, default_pace_seconds_per_500m))
}

/// Absolute split for a step, the midpoint when a range is given
fn target_pace(guidance: &Guidance) -> Option<f64> {
    let tenths = |p: &Option<PaceTarget>| match p {
        Some(PaceTarget::Absolute { tenths }) => Some(f64::from(*tenths) / 10.0),
        _ => None,
    };

    match (tenths(&guidance.pace), tenths(&guidance.pace_max)) {
        (Some(min), Some(max)) => Some((min + max) / 2.0),
        (Some(pace), None) => Some(pace),
        _ => None,
    }
}

pub fn estimate_structure(structure: &WorkoutStructure, default_pace_seconds_per_500m: f64) -> DurationEstimate {
    let default_pace = if default_pace_seconds_per_500m.is_finite() && default_pace_seconds_per_500m > 0.0 {
        default_pace_seconds_per_500m
    } else {
        tracing::warn!(
            "Unusable default pace {}, using {}s/500m",
            default_pace_seconds_per_500m,
            FALLBACK_PACE_SECONDS
        );
        FALLBACK_PACE_SECONDS
    };

    let mut work_distance = 0.0_f64;
    let mut work_time = 0.0_f64;
    let mut rest_time = 0.0_f64;
    let mut requires_baseline = false;

    let mut used_exact = false;
    let mut used_target = false;
    let mut used_default = false;
    let mut skipped = false;
    let mut paces: Vec<f64> = Vec::new();

    for step in structure.expanded_steps() {
        if step.is_rest() {
            rest_time += f64::from(step.value);
            continue;
        }

        if step.guidance.requires_baseline() {
            requires_baseline = true;
        }

        let target = target_pace(&step.guidance);
        let pace = target.unwrap_or(default_pace);

        match step.unit {
            DurationType::Distance => {
                let meters = f64::from(step.value);
                work_distance += meters;
                work_time += meters / 500.0 * pace;
                if target.is_some() {
                    used_target = true;
                } else {
                    used_default = true;
                }
                paces.push(pace);
            }
            DurationType::Time => {
                let seconds = f64::from(step.value);
                work_time += seconds;
                work_distance += seconds / pace * 500.0;
                used_exact = true;
                paces.push(pace);
            }
            DurationType::Calories => {
                // Calories depend on the athlete and the machine
                requires_baseline = true;
                skipped = true;
            }
        }
    }

    let estimate_method = match (used_exact, used_target, used_default, skipped) {
        (false, false, false, true) => EstimateMethod::Unresolved,
        (_, false, false, false) => EstimateMethod::Exact,
        (false, true, false, false) => EstimateMethod::TargetPace,
        (false, false, true, false) => EstimateMethod::DefaultPace,
        _ => EstimateMethod::Mixed,
    };

    let pace_used = match paces.split_first() {
        Some((first, rest)) if rest.iter().all(|p| (p - first).abs() < f64::EPSILON) => Some(*first),
        _ => None,
    };

    let work_time = work_time.round() as u32;
    let rest_time = rest_time.round() as u32;

    tracing::debug!(
        "Estimated {}s work, {}s rest via {:?}",
        work_time,
        rest_time,
        estimate_method
    );

    DurationEstimate {
        work_distance: work_distance.round() as u32,
        work_time,
        rest_time,
        total_time: work_time.saturating_add(rest_time),
        estimate_method,
        pace_used,
        requires_baseline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_based_is_exact() {
        let estimate = estimate_duration("3x10:00/2:00r", 120.0).unwrap();
        assert_eq!(estimate.work_time, 1800);
        assert_eq!(estimate.rest_time, 360);
        assert_eq!(estimate.total_time, 2160);
        assert_eq!(estimate.work_distance, 7500);
        assert_eq!(estimate.estimate_method, EstimateMethod::Exact);
        assert!(!estimate.requires_baseline);
    }

    #[test]
    fn test_distance_uses_default_pace() {
        let estimate = estimate_duration("4x500m/1:00r", 120.0).unwrap();
        assert_eq!(estimate.work_distance, 2000);
        assert_eq!(estimate.work_time, 480);
        assert_eq!(estimate.rest_time, 240);
        assert_eq!(estimate.estimate_method, EstimateMethod::DefaultPace);
        assert_eq!(estimate.pace_used, Some(120.0));
    }

    #[test]
    fn test_distance_uses_target_pace() {
        let estimate = estimate_duration("2000m@1:45", 120.0).unwrap();
        assert_eq!(estimate.work_time, 420);
        assert_eq!(estimate.estimate_method, EstimateMethod::TargetPace);

        let range = estimate_duration("1000m@2:00-2:10", 150.0).unwrap();
        assert_eq!(range.work_time, 250);
    }

    #[test]
    fn test_mixed_methods() {
        let estimate = estimate_duration("[w]10:00 + 2000m@1:50 + 1000m", 120.0).unwrap();
        assert_eq!(estimate.estimate_method, EstimateMethod::Mixed);
        assert_eq!(estimate.work_time, 600 + 440 + 240);
        assert_eq!(estimate.pace_used, None);
    }

    #[test]
    fn test_baseline_required() {
        let relative = estimate_duration("5x1000m@2k+5/2:00r", 120.0).unwrap();
        assert!(relative.requires_baseline);
        assert_eq!(relative.estimate_method, EstimateMethod::DefaultPace);

        let zone = estimate_duration("60:00@UT2", 120.0).unwrap();
        assert!(zone.requires_baseline);

        let calories = estimate_duration("10x20cal/1:00r", 120.0).unwrap();
        assert!(calories.requires_baseline);
        assert_eq!(calories.work_time, 0);
        assert_eq!(calories.rest_time, 600);
    }

    #[test]
    fn test_calorie_work_is_never_exact() {
        let calories = estimate_duration("10x20cal/1:00r", 120.0).unwrap();
        assert_eq!(calories.estimate_method, EstimateMethod::Unresolved);
        assert_eq!(calories.pace_used, None);

        let with_time = estimate_duration("10:00 + 4x20cal/1:00r", 120.0).unwrap();
        assert_eq!(with_time.estimate_method, EstimateMethod::Mixed);
        assert_eq!(with_time.work_time, 600);
    }

    #[test]
    fn test_unparsable_and_bad_pace() {
        assert!(estimate_duration("not a workout", 120.0).is_none());

        let estimate = estimate_duration("500m", -1.0).unwrap();
        assert_eq!(estimate.work_time, 120);
    }
}
