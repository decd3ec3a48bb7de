//! Conversion from parsed structures to flat intervals.

use crate::naming::canonical_name;
use crate::{DurationType, FlatInterval, WorkoutShape, WorkoutStep, WorkoutStructure};

/// Flatten a structure into intervals, folding each rest step into the
/// `rest_time` of the work interval before it.
pub fn to_intervals(structure: &WorkoutStructure) -> Vec<FlatInterval> {
    fold_steps(&structure.expanded_steps())
}

/// Like [`to_intervals`], but only the main set.
///
/// Warmup, cooldown and test work steps are dropped together with the
/// rests that follow them. Steady-state and fixed-interval workouts are a
/// single block and are returned whole. If nothing main remains, the full
/// sequence is returned instead.
pub fn to_main_intervals(structure: &WorkoutStructure) -> Vec<FlatInterval> {
    let WorkoutShape::Variable(variable) = &structure.shape else {
        return to_intervals(structure);
    };

    // Whether the most recent work step survived the strip
    let mut keeping: Option<bool> = None;
    let mut kept: Vec<WorkoutStep> = Vec::new();

    for step in &variable.steps {
        if step.is_rest() {
            if keeping.unwrap_or(step.block_type.is_main()) {
                kept.push(step.clone());
            }
        } else {
            let main = step.block_type.is_main();
            keeping = Some(main);
            if main {
                kept.push(step.clone());
            }
        }
    }

    if kept.iter().all(|s| s.is_rest()) {
        tracing::debug!("No main-set steps left after stripping bookends");
        return to_intervals(structure);
    }

    fold_steps(&kept)
}

/// Canonical name of the main set, blind to warmup and cooldown
pub fn compute_canonical_name(structure: &WorkoutStructure) -> String {
    canonical_name(&to_main_intervals(structure))
}

fn fold_steps(steps: &[WorkoutStep]) -> Vec<FlatInterval> {
    let mut intervals: Vec<FlatInterval> = Vec::with_capacity(steps.len());

    for step in steps {
        if step.is_rest() {
            let tenths = step.value.saturating_mul(10);
            match intervals.last_mut() {
                Some(last) if last.is_rest() => last.time = last.time.saturating_add(tenths),
                Some(last) => last.rest_time = last.rest_time.saturating_add(tenths),
                None => intervals.push(FlatInterval::rest(tenths)),
            }
        } else {
            intervals.push(work_interval(step));
        }
    }

    intervals
}

fn work_interval(step: &WorkoutStep) -> FlatInterval {
    match step.unit {
        DurationType::Distance => FlatInterval::distance(step.value),
        DurationType::Time => FlatInterval::time(step.value.saturating_mul(10)),
        DurationType::Calories => FlatInterval::calories(step.value),
    }
}
