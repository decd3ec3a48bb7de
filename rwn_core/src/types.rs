//! Core domain types for workout notation.
//!
//! This module defines the fundamental types used throughout the system:
//! - Modality, block types and duration units
//! - Pace and stroke-rate guidance
//! - The parsed workout structure and its steps
//! - Flat intervals (the currency of naming and detection)
//! - Warmup/cooldown detection results

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Modality and Block Types
// ============================================================================

/// Machine or sport the workout is performed on
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Rowing,
    Biking,
    Skiing,
    Running,
    Other,
}

impl Modality {
    /// Match a notation prefix such as `Row` or `bike` (without the colon)
    pub fn from_prefix(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "row" | "rowing" | "rower" => Some(Modality::Rowing),
            "bike" | "biking" | "bikeerg" => Some(Modality::Biking),
            "ski" | "skiing" | "skierg" => Some(Modality::Skiing),
            "run" | "running" => Some(Modality::Running),
            "other" => Some(Modality::Other),
            _ => None,
        }
    }

    /// Canonical notation prefix, without the colon
    pub fn prefix(&self) -> &'static str {
        match self {
            Modality::Rowing => "Row",
            Modality::Biking => "Bike",
            Modality::Skiing => "Ski",
            Modality::Running => "Run",
            Modality::Other => "Other",
        }
    }
}

/// Semantic role of a step within a workout
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    #[default]
    Main,
    Warmup,
    Cooldown,
    Test,
}

impl BlockType {
    pub fn is_main(&self) -> bool {
        matches!(self, BlockType::Main)
    }

    /// Parse the body of a bracket prefix (`w` in `[w]`)
    pub fn from_bracket(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "w" | "wu" | "warmup" => Some(BlockType::Warmup),
            "c" | "cd" | "cooldown" => Some(BlockType::Cooldown),
            "t" | "test" => Some(BlockType::Test),
            _ => None,
        }
    }

    /// Parse a legacy inline tag (`warmup` in `#warmup`)
    pub fn from_legacy_tag(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "warmup" => Some(BlockType::Warmup),
            "cooldown" => Some(BlockType::Cooldown),
            "test" | "benchmark" => Some(BlockType::Test),
            _ => None,
        }
    }

    /// Bracket prefix emitted by the serializer; main blocks have none
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            BlockType::Main => None,
            BlockType::Warmup => Some("[w]"),
            BlockType::Cooldown => Some("[c]"),
            BlockType::Test => Some("[t]"),
        }
    }
}

/// Unit a step's value is measured in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DurationType {
    /// Meters
    Distance,
    /// Whole seconds
    Time,
    Calories,
}

// ============================================================================
// Guidance
// ============================================================================

/// Reference test a relative pace is measured against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferencePace {
    TwoK,
    FiveK,
    SixK,
    ThirtyMinute,
    SixtyMinute,
}

impl ReferencePace {
    pub const ALL: [ReferencePace; 5] = [
        ReferencePace::TwoK,
        ReferencePace::FiveK,
        ReferencePace::SixK,
        ReferencePace::ThirtyMinute,
        ReferencePace::SixtyMinute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferencePace::TwoK => "2k",
            ReferencePace::FiveK => "5k",
            ReferencePace::SixK => "6k",
            ReferencePace::ThirtyMinute => "30m",
            ReferencePace::SixtyMinute => "60m",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL.into_iter().find(|r| r.as_str() == lower)
    }
}

/// Named training intensity zone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrainingZone {
    Ut2,
    Ut1,
    At,
    Tr,
    An,
}

impl TrainingZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingZone::Ut2 => "UT2",
            TrainingZone::Ut1 => "UT1",
            TrainingZone::At => "AT",
            TrainingZone::Tr => "TR",
            TrainingZone::An => "AN",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UT2" => Some(TrainingZone::Ut2),
            "UT1" => Some(TrainingZone::Ut1),
            "AT" => Some(TrainingZone::At),
            "TR" => Some(TrainingZone::Tr),
            "AN" => Some(TrainingZone::An),
            _ => None,
        }
    }
}

/// A pace target, serialized as its notation text (`2:05`, `2k+10`, `UT2`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PaceTarget {
    /// Split per 500m in deciseconds
    Absolute { tenths: u32 },
    /// Offset in deciseconds from a reference test pace
    Relative {
        reference: ReferencePace,
        offset_tenths: i32,
    },
    Zone(TrainingZone),
}

impl PaceTarget {
    /// True when the target cannot be turned into a split without the
    /// athlete's own test results.
    pub fn requires_baseline(&self) -> bool {
        !matches!(self, PaceTarget::Absolute { .. })
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, PaceTarget::Relative { .. })
    }
}

impl fmt::Display for PaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaceTarget::Absolute { tenths } => f.write_str(&format_clock_tenths(*tenths)),
            PaceTarget::Relative {
                reference,
                offset_tenths,
            } => {
                f.write_str(reference.as_str())?;
                if *offset_tenths != 0 {
                    let sign = if *offset_tenths > 0 { '+' } else { '-' };
                    let abs = offset_tenths.unsigned_abs();
                    if abs % 10 == 0 {
                        write!(f, "{}{}", sign, abs / 10)?;
                    } else {
                        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)?;
                    }
                }
                Ok(())
            }
            PaceTarget::Zone(zone) => f.write_str(zone.as_str()),
        }
    }
}

impl From<PaceTarget> for String {
    fn from(pace: PaceTarget) -> Self {
        pace.to_string()
    }
}

impl TryFrom<String> for PaceTarget {
    type Error = crate::ParseError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        crate::guidance::parse_pace_target(&s)
            .ok_or(crate::ParseError::InvalidGuidance { text: s })
    }
}

/// Optional pace and stroke-rate targets for a work step
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guidance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<PaceTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_max: Option<PaceTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_max: Option<u32>,
}

impl Guidance {
    pub fn is_empty(&self) -> bool {
        self.pace.is_none() && self.pace_max.is_none() && self.rate.is_none() && self.rate_max.is_none()
    }

    /// Whether any pace target needs external baseline data to resolve
    pub fn requires_baseline(&self) -> bool {
        self.pace.iter().chain(self.pace_max.iter()).any(|p| p.requires_baseline())
    }
}

// ============================================================================
// Workout Structure
// ============================================================================

/// A single block of work: value, unit, guidance and semantic role
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Work {
    pub unit: DurationType,
    pub value: u32,
    #[serde(default, skip_serializing_if = "Guidance::is_empty")]
    pub guidance: Guidance,
    #[serde(default, skip_serializing_if = "BlockType::is_main")]
    pub block_type: BlockType,
}

impl Work {
    pub fn new(unit: DurationType, value: u32) -> Self {
        Self {
            unit,
            value,
            guidance: Guidance::default(),
            block_type: BlockType::Main,
        }
    }
}

/// Repeated identical work with a shared rest
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixedInterval {
    pub repeats: u32,
    pub work: Work,
    /// Rest after each repeat, in seconds
    #[serde(default)]
    pub rest_seconds: u32,
}

/// Whether a step is effort or recovery
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Work,
    Rest,
}

/// One step of a variable workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutStep {
    pub kind: StepKind,
    pub unit: DurationType,
    pub value: u32,
    #[serde(default, skip_serializing_if = "Guidance::is_empty")]
    pub guidance: Guidance,
    #[serde(default, skip_serializing_if = "BlockType::is_main")]
    pub block_type: BlockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl WorkoutStep {
    pub fn work(work: Work) -> Self {
        Self {
            kind: StepKind::Work,
            unit: work.unit,
            value: work.value,
            guidance: work.guidance,
            block_type: work.block_type,
            modality: None,
            tags: Vec::new(),
        }
    }

    pub fn rest(seconds: u32, block_type: BlockType) -> Self {
        Self {
            kind: StepKind::Rest,
            unit: DurationType::Time,
            value: seconds,
            guidance: Guidance::default(),
            block_type,
            modality: None,
            tags: Vec::new(),
        }
    }

    pub fn is_rest(&self) -> bool {
        self.kind == StepKind::Rest
    }
}

/// Ordered list of heterogeneous steps
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariableWorkout {
    pub steps: Vec<WorkoutStep>,
}

/// The three shapes a workout can take
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutShape {
    SteadyState(Work),
    Interval(FixedInterval),
    Variable(VariableWorkout),
}

/// A parsed workout: shape plus workout-wide modality and tags
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutStructure {
    #[serde(flatten)]
    pub shape: WorkoutShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl WorkoutStructure {
    pub fn new(shape: WorkoutShape) -> Self {
        Self {
            shape,
            modality: None,
            tags: Vec::new(),
        }
    }

    pub fn steady_state(work: Work) -> Self {
        Self::new(WorkoutShape::SteadyState(work))
    }

    pub fn interval(repeats: u32, work: Work, rest_seconds: u32) -> Self {
        Self::new(WorkoutShape::Interval(FixedInterval {
            repeats,
            work,
            rest_seconds,
        }))
    }

    pub fn variable(steps: Vec<WorkoutStep>) -> Self {
        Self::new(WorkoutShape::Variable(VariableWorkout { steps }))
    }

    /// Expand any shape into its literal step sequence.
    ///
    /// Fixed intervals produce a rest step after every repeat (including
    /// the last) when the shared rest is nonzero.
    pub fn expanded_steps(&self) -> Vec<WorkoutStep> {
        match &self.shape {
            WorkoutShape::SteadyState(work) => vec![WorkoutStep::work(work.clone())],
            WorkoutShape::Interval(fixed) => {
                let mut steps = Vec::new();
                for _ in 0..fixed.repeats {
                    steps.push(WorkoutStep::work(fixed.work.clone()));
                    if fixed.rest_seconds > 0 {
                        steps.push(WorkoutStep::rest(fixed.rest_seconds, fixed.work.block_type));
                    }
                }
                steps
            }
            WorkoutShape::Variable(variable) => variable.steps.clone(),
        }
    }
}

// ============================================================================
// Flat Intervals
// ============================================================================

/// Explicit interval type as recorded by a monitor
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntervalType {
    Distance,
    Time,
    Calories,
    Rest,
}

/// One atomic work unit. Zero means "not applicable".
///
/// `rest_time` is the rest taken after this interval.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlatInterval {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IntervalType>,
    /// Meters
    #[serde(default)]
    pub distance: u32,
    /// Deciseconds
    #[serde(default)]
    pub time: u32,
    /// Deciseconds
    #[serde(default)]
    pub rest_time: u32,
    #[serde(default)]
    pub watts: u32,
    #[serde(default)]
    pub calories_total: u32,
}

impl FlatInterval {
    pub fn distance(meters: u32) -> Self {
        Self {
            kind: Some(IntervalType::Distance),
            distance: meters,
            ..Self::default()
        }
    }

    pub fn time(deciseconds: u32) -> Self {
        Self {
            kind: Some(IntervalType::Time),
            time: deciseconds,
            ..Self::default()
        }
    }

    pub fn calories(calories: u32) -> Self {
        Self {
            kind: Some(IntervalType::Calories),
            calories_total: calories,
            ..Self::default()
        }
    }

    pub fn rest(deciseconds: u32) -> Self {
        Self {
            kind: Some(IntervalType::Rest),
            time: deciseconds,
            ..Self::default()
        }
    }

    pub fn with_rest(mut self, deciseconds: u32) -> Self {
        self.rest_time = deciseconds;
        self
    }

    pub fn with_time(mut self, deciseconds: u32) -> Self {
        self.time = deciseconds;
        self
    }

    pub fn with_distance(mut self, meters: u32) -> Self {
        self.distance = meters;
        self
    }

    pub fn with_watts(mut self, watts: u32) -> Self {
        self.watts = watts;
        self
    }

    pub fn is_rest(&self) -> bool {
        self.kind == Some(IntervalType::Rest)
    }
}

// ============================================================================
// Detection Result
// ============================================================================

/// Outcome of warmup/cooldown detection over recorded intervals.
///
/// Indices refer to positions in the caller's input slice.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectionResult {
    pub detected: bool,
    pub warmup_indices: Vec<usize>,
    pub cooldown_indices: Vec<usize>,
    pub main_indices: Vec<usize>,
    pub main_canonical_name: String,
    pub suggested_rwn: String,
    pub description: String,
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// Format whole seconds as `m:ss` (minutes are not wrapped into hours)
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Format deciseconds as `m:ss`, or `m:ss.d` when there is a fraction
pub fn format_clock_tenths(tenths: u32) -> String {
    let seconds = tenths / 10;
    if tenths % 10 == 0 {
        format_clock(seconds)
    } else {
        format!("{}.{}", format_clock(seconds), tenths % 10)
    }
}
