//! Render a workout structure back to notation text.
//!
//! Output always re-parses to a structure with the same canonical name.
//! Non-main segments each carry their own block prefix, since the parser
//! does not carry a block type from one segment to the next.

use crate::guidance::render;
use crate::{
    format_clock, BlockType, DurationType, FixedInterval, Guidance, Work, WorkoutShape,
    WorkoutStep, WorkoutStructure,
};

/// Convert a structure to its notation string
pub fn to_notation(structure: &WorkoutStructure) -> String {
    let body = match &structure.shape {
        WorkoutShape::SteadyState(work) => render_work(work, &structure.tags),
        WorkoutShape::Interval(fixed) => render_fixed(fixed, &structure.tags),
        WorkoutShape::Variable(variable) => render_steps(&variable.steps),
    };

    match structure.modality {
        Some(modality) => format!("{}: {}", modality.prefix(), body),
        None => body,
    }
}

fn render_value(unit: DurationType, value: u32) -> String {
    match unit {
        DurationType::Distance => format!("{}m", value),
        DurationType::Time => format_clock(value),
        DurationType::Calories => format!("{}cal", value),
    }
}

fn render_rest(seconds: u32) -> String {
    format!("{}r", format_clock(seconds))
}

fn render_component(unit: DurationType, value: u32, guidance: &Guidance, tags: &[String]) -> String {
    let mut out = render_value(unit, value);
    out.push_str(&render(guidance));
    for tag in tags {
        out.push_str(" #");
        out.push_str(tag);
    }
    out
}

fn block_prefix(block_type: BlockType) -> &'static str {
    block_type.prefix().unwrap_or("")
}

fn render_work(work: &Work, tags: &[String]) -> String {
    format!(
        "{}{}",
        block_prefix(work.block_type),
        render_component(work.unit, work.value, &work.guidance, tags)
    )
}

fn render_fixed(fixed: &FixedInterval, tags: &[String]) -> String {
    let work = &fixed.work;
    let mut out = block_prefix(work.block_type).to_string();
    if fixed.repeats > 1 {
        out.push_str(&format!("{}x", fixed.repeats));
    }
    out.push_str(&render_component(work.unit, work.value, &work.guidance, tags));
    if fixed.rest_seconds > 0 {
        out.push('/');
        out.push_str(&render_rest(fixed.rest_seconds));
    }
    out
}

/// One rendered unit of a variable workout before compression
#[derive(Debug, PartialEq)]
enum Piece<'a> {
    Work {
        step: &'a WorkoutStep,
        rest: Option<u32>,
    },
    Rest {
        seconds: u32,
        block_type: BlockType,
    },
}

fn pieces(steps: &[WorkoutStep]) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < steps.len() {
        let step = &steps[i];
        if step.is_rest() {
            out.push(Piece::Rest {
                seconds: step.value,
                block_type: step.block_type,
            });
            i += 1;
            continue;
        }

        match steps.get(i + 1).filter(|next| next.is_rest()) {
            Some(rest) => {
                out.push(Piece::Work {
                    step,
                    rest: Some(rest.value),
                });
                i += 2;
            }
            None => {
                out.push(Piece::Work { step, rest: None });
                i += 1;
            }
        }
    }

    out
}

fn render_piece(piece: &Piece<'_>, count: usize) -> String {
    match piece {
        Piece::Work { step, rest } => {
            let mut out = block_prefix(step.block_type).to_string();
            if count > 1 {
                out.push_str(&format!("{}x", count));
            }
            out.push_str(&render_component(step.unit, step.value, &step.guidance, &step.tags));
            if let Some(seconds) = rest {
                out.push('/');
                out.push_str(&render_rest(*seconds));
            }
            out
        }
        Piece::Rest {
            seconds,
            block_type,
        } => {
            // Repeated standalone rests are simply summed
            format!(
                "{}{}",
                block_prefix(*block_type),
                render_rest(seconds.saturating_mul(count as u32))
            )
        }
    }
}

fn render_steps(steps: &[WorkoutStep]) -> String {
    let pieces = pieces(steps);
    let mut segments: Vec<String> = Vec::new();
    let mut i = 0;

    while i < pieces.len() {
        let run = pieces[i..]
            .iter()
            .take_while(|p| same_piece(p, &pieces[i]))
            .count();
        segments.push(render_piece(&pieces[i], run));
        i += run;
    }

    segments.join(" + ")
}

fn same_piece(a: &Piece<'_>, b: &Piece<'_>) -> bool {
    match (a, b) {
        (
            Piece::Work {
                step: sa,
                rest: ra,
            },
            Piece::Work {
                step: sb,
                rest: rb,
            },
        ) => {
            ra == rb
                && sa.unit == sb.unit
                && sa.value == sb.value
                && sa.guidance == sb.guidance
                && sa.block_type == sb.block_type
                && sa.tags == sb.tags
        }
        _ => a == b,
    }
}
