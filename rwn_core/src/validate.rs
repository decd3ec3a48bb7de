//! Notation validation with diagnostics and soft warnings.

use crate::{format_clock, DurationType, Parser, WorkoutStructure};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SHORTHAND_KM: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^@\w.:])(\d+(?:\.\d+)?)k\b").ok());

static BARE_X: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)(?:^|[\s+(\]])x\s*\d").ok());

static DANGLING_SLASH: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/\s*(?:$|[+)])").ok());

static REPEAT_COUNT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*[x×]").ok());

/// Outcome of validating a notation string
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<WorkoutStructure>,
}

/// Thresholds above which a parsed value is flagged for review
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_repeats: u32,
    pub max_distance_meters: u32,
    pub max_duration_seconds: u32,
    pub max_rest_seconds: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_repeats: 50,
            max_distance_meters: 50_000,
            max_duration_seconds: 3 * 3600,
            max_rest_seconds: 30 * 60,
        }
    }
}

/// Validate with the default parser and limits
pub fn validate(text: &str) -> ValidationResult {
    validate_with(text, &Parser::default(), &ValidationLimits::default())
}

/// Validate with an explicit parser and warning limits
pub fn validate_with(text: &str, parser: &Parser, limits: &ValidationLimits) -> ValidationResult {
    match parser.parse_notation(text) {
        Ok(structure) => ValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: warnings(text, &structure, limits),
            structure: Some(structure),
        },
        Err(e) => {
            let mut errors = vec![e.to_string()];
            for hint in hints(text) {
                if !errors.contains(&hint) {
                    errors.push(hint);
                }
            }
            ValidationResult {
                valid: false,
                errors,
                ..ValidationResult::default()
            }
        }
    }
}

fn matches(pattern: &Lazy<Option<Regex>>, text: &str) -> bool {
    let regex: &Option<Regex> = pattern;
    regex.as_ref().is_some_and(|r| r.is_match(text))
}

/// Best-effort suggestions for common mistakes
fn hints(text: &str) -> Vec<String> {
    let mut out = Vec::new();

    let regex: &Option<Regex> = &SHORTHAND_KM;
    if let Some(caps) = regex.as_ref().and_then(|r| r.captures(text)) {
        let km = &caps[1];
        let meters = km
            .parse::<f64>()
            .map(|k| format!("{}m", (k * 1000.0).round() as u64))
            .unwrap_or_else(|_| "meters".into());
        out.push(format!("Use meters instead of '{}k' shorthand, e.g. {}", km, meters));
    }

    if matches(&BARE_X, text) {
        out.push("Add a repeat count before 'x', e.g. 4x500m".into());
    }

    if matches(&DANGLING_SLASH, text) {
        out.push("Add a rest duration after '/', e.g. /1:00r".into());
    }

    let opening = text.matches('(').count();
    let closing = text.matches(')').count();
    if opening != closing {
        out.push(format!(
            "Unbalanced parentheses: {} opening, {} closing",
            opening, closing
        ));
    }

    out
}

/// Plausible but unusual values worth a second look
fn warnings(text: &str, structure: &WorkoutStructure, limits: &ValidationLimits) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut warn = |message: String| {
        if !out.contains(&message) {
            out.push(message);
        }
    };

    let regex: &Option<Regex> = &REPEAT_COUNT;
    if let Some(regex) = regex.as_ref() {
        for caps in regex.captures_iter(text) {
            if let Ok(count) = caps[1].parse::<u32>() {
                if count > limits.max_repeats {
                    warn(format!(
                        "Repeat count {} is above {}, verify",
                        count, limits.max_repeats
                    ));
                }
            }
        }
    }

    for step in structure.expanded_steps() {
        if step.is_rest() {
            if step.value > limits.max_rest_seconds {
                warn(format!(
                    "Rest {} is longer than {}, verify",
                    format_clock(step.value),
                    format_clock(limits.max_rest_seconds)
                ));
            }
            continue;
        }

        match step.unit {
            DurationType::Distance if step.value > limits.max_distance_meters => warn(format!(
                "Distance {}m is above {}m, verify",
                step.value, limits.max_distance_meters
            )),
            DurationType::Time if step.value > limits.max_duration_seconds => warn(format!(
                "Duration {} is longer than {}, verify",
                format_clock(step.value),
                format_clock(limits.max_duration_seconds)
            )),
            _ => {}
        }
    }

    out
}
