//! Recursive-descent parser for workout notation.
//!
//! Grammar:
//!
//! ```text
//! workout   := modality? segment ( '+' segment )*
//! segment   := group | interval | single
//! group     := INT 'x' '(' workout ')' ( '/' REST )?
//! interval  := INT 'x' component ( '/' REST )?
//! single    := component ( '/' REST )?
//! component := blockTag? value unit? guidance* tag*
//! ```
//!
//! Groups are unrolled into literal steps. Anything that does not match
//! fails the whole parse; nothing is silently dropped.

use crate::guidance::{apply_match, match_guidance};
use crate::lexer::{parse_clock_tenths, tokenize, Token, TokenKind};
use crate::{
    BlockType, DurationType, Modality, ParseError, Work, WorkoutShape, WorkoutStep,
    WorkoutStructure,
};

/// Deepest allowed `N x ( … )` nesting
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;

/// Upper bound on steps produced by unrolling groups and repeat counts
pub const MAX_UNROLLED_STEPS: usize = 10_000;

/// Notation parser with a configurable nesting limit
#[derive(Clone, Copy, Debug)]
pub struct Parser {
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Parse notation, returning `None` for anything unparsable
    pub fn parse(&self, text: &str) -> Option<WorkoutStructure> {
        match self.parse_notation(text) {
            Ok(structure) => Some(structure),
            Err(e) => {
                tracing::debug!("Failed to parse notation {:?}: {}", text, e);
                None
            }
        }
    }

    /// Parse notation, reporting why it failed
    pub fn parse_notation(&self, text: &str) -> Result<WorkoutStructure, ParseError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut cursor = Cursor {
            tokens: &tokens,
            pos: 0,
            max_depth: self.max_depth,
        };

        let modality = cursor.modality();
        let segments = cursor.sequence(0)?;
        if let Some(token) = cursor.peek() {
            return Err(unexpected(token));
        }

        build(segments, modality)
    }
}

/// Parse notation with the default nesting limit
pub fn parse(text: &str) -> Option<WorkoutStructure> {
    Parser::default().parse(text)
}

/// Parse notation with the default nesting limit, keeping the error
pub fn parse_notation(text: &str) -> Result<WorkoutStructure, ParseError> {
    Parser::default().parse_notation(text)
}

// ============================================================================
// Syntax tree
// ============================================================================

#[derive(Clone, Debug)]
struct Component {
    work: Work,
    tags: Vec<String>,
}

impl Component {
    fn step(&self) -> WorkoutStep {
        let mut step = WorkoutStep::work(self.work.clone());
        step.tags = self.tags.clone();
        step
    }
}

#[derive(Clone, Debug)]
enum Segment {
    Single(Component),
    /// `work/rest` without a repeat count
    Pair { work: Component, rest: u32 },
    Repeat {
        count: u32,
        work: Component,
        rest: Option<u32>,
    },
    Group {
        count: u32,
        body: Vec<Segment>,
        rest: Option<u32>,
        block_type: Option<BlockType>,
    },
    /// Standalone `2:00r`
    Rest { seconds: u32, block_type: BlockType },
}

// ============================================================================
// Token cursor
// ============================================================================

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn next_kind(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn modality(&mut self) -> Option<Modality> {
        match self.peek_kind() {
            Some(TokenKind::Modality(m)) => {
                self.pos += 1;
                Some(*m)
            }
            _ => None,
        }
    }

    fn sequence(&mut self, depth: usize) -> Result<Vec<Segment>, ParseError> {
        let mut segments = vec![self.segment(depth)?];

        loop {
            match self.peek() {
                None => break,
                Some(Token {
                    kind: TokenKind::Plus,
                    ..
                }) => {
                    self.pos += 1;
                    segments.push(self.segment(depth)?);
                }
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => {
                    if depth == 0 {
                        return Err(ParseError::UnbalancedParens);
                    }
                    break;
                }
                Some(token) => return Err(unexpected(token)),
            }
        }

        Ok(segments)
    }

    fn segment(&mut self, depth: usize) -> Result<Segment, ParseError> {
        let prefix = self.block_tag()?;
        let token = self.peek().ok_or(ParseError::UnexpectedEnd)?;

        match &token.kind {
            TokenKind::Quantity { number, suffix } if suffix == "x" => {
                self.pos += 1;
                let count = parse_count(number, token)?;
                self.repeat(count, prefix, depth)
            }
            TokenKind::Quantity { number, suffix }
                if suffix.is_empty()
                    && matches!(self.next_kind(), Some(TokenKind::Word(w)) if w == "x") =>
            {
                self.pos += 2;
                let count = parse_count(number, token)?;
                self.repeat(count, prefix, depth)
            }
            TokenKind::Word(w) if w == "x" => Err(ParseError::MissingRepeatCount { pos: token.pos }),
            TokenKind::LParen => self.repeat(1, prefix, depth),
            TokenKind::Quantity { number, suffix } if is_rest_suffix(suffix) => {
                self.pos += 1;
                Ok(Segment::Rest {
                    seconds: rest_seconds(number, suffix)?,
                    block_type: prefix.unwrap_or_default(),
                })
            }
            _ => {
                let work = self.component(prefix)?;
                match self.optional_rest()? {
                    Some(rest) => Ok(Segment::Pair { work, rest }),
                    None => Ok(Segment::Single(work)),
                }
            }
        }
    }

    fn repeat(
        &mut self,
        count: u32,
        prefix: Option<BlockType>,
        depth: usize,
    ) -> Result<Segment, ParseError> {
        if let Some(TokenKind::LParen) = self.peek_kind() {
            self.pos += 1;
            if depth + 1 > self.max_depth {
                return Err(ParseError::NestingTooDeep {
                    max: self.max_depth,
                });
            }

            let body = self.sequence(depth + 1)?;
            match self.peek_kind() {
                Some(TokenKind::RParen) => self.pos += 1,
                _ => return Err(ParseError::UnbalancedParens),
            }

            return Ok(Segment::Group {
                count,
                body,
                rest: self.optional_rest()?,
                block_type: prefix,
            });
        }

        let work = self.component(prefix)?;
        Ok(Segment::Repeat {
            count,
            work,
            rest: self.optional_rest()?,
        })
    }

    fn component(&mut self, prefix: Option<BlockType>) -> Result<Component, ParseError> {
        let bracket = self.block_tag()?.or(prefix);

        let token = self.advance().ok_or(ParseError::UnexpectedEnd)?;
        let (unit, value) = match &token.kind {
            TokenKind::Quantity { number, suffix } => quantity_value(number, suffix, token)?,
            TokenKind::Word(w) if w == "x" => {
                return Err(ParseError::MissingRepeatCount { pos: token.pos })
            }
            _ => return Err(unexpected(token)),
        };

        let mut work = Work::new(unit, value);
        let mut legacy = None;
        let mut tags: Vec<String> = Vec::new();

        loop {
            match self.peek_kind() {
                Some(TokenKind::Guidance(text)) => {
                    self.pos += 1;
                    let matched = match_guidance(text)
                        .ok_or_else(|| ParseError::InvalidGuidance { text: text.clone() })?;
                    apply_match(&mut work.guidance, matched);
                }
                Some(TokenKind::Tag(tag)) => {
                    self.pos += 1;
                    match BlockType::from_legacy_tag(tag) {
                        Some(block) => {
                            legacy.get_or_insert(block);
                        }
                        None if !tags.contains(tag) => tags.push(tag.clone()),
                        None => {}
                    }
                }
                _ => break,
            }
        }

        work.block_type = bracket.or(legacy).unwrap_or_default();
        Ok(Component { work, tags })
    }

    fn block_tag(&mut self) -> Result<Option<BlockType>, ParseError> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        let TokenKind::BlockTag(body) = &token.kind else {
            return Ok(None);
        };

        self.pos += 1;
        BlockType::from_bracket(body)
            .map(Some)
            .ok_or_else(|| unexpected(token))
    }

    fn optional_rest(&mut self) -> Result<Option<u32>, ParseError> {
        let slash_pos = match self.peek() {
            Some(Token {
                kind: TokenKind::Slash,
                pos,
            }) => *pos,
            _ => return Ok(None),
        };
        self.pos += 1;

        match self.peek_kind() {
            Some(TokenKind::Quantity { number, suffix }) => {
                self.pos += 1;
                rest_seconds(number, suffix).map(Some)
            }
            _ => Err(ParseError::MissingRest { pos: slash_pos }),
        }
    }
}

// ============================================================================
// Lexical value helpers
// ============================================================================

fn unexpected(token: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        found: token.describe(),
        pos: token.pos,
    }
}

fn parse_count(number: &str, token: &Token) -> Result<u32, ParseError> {
    let count: u32 = number.parse().map_err(|_| unexpected(token))?;
    if count == 0 {
        return Err(ParseError::ZeroRepeats);
    }
    if count as usize > MAX_UNROLLED_STEPS {
        return Err(ParseError::TooManySteps {
            max: MAX_UNROLLED_STEPS,
        });
    }
    Ok(count)
}

fn is_rest_suffix(suffix: &str) -> bool {
    matches!(suffix, "r" | "sr" | "secr")
}

fn tenths_to_seconds(tenths: u32) -> u32 {
    tenths.saturating_add(5) / 10
}

/// Rest values must be times: `1:00r`, `1:00`, `90sr`, `90s`
fn rest_seconds(number: &str, suffix: &str) -> Result<u32, ParseError> {
    let text = format!("{}{}", number, suffix);

    if number.contains(':') && matches!(suffix, "r" | "") {
        return parse_clock_tenths(number)
            .map(tenths_to_seconds)
            .ok_or(ParseError::InvalidTime { text });
    }

    if !number.contains(':') && matches!(suffix, "s" | "sr" | "sec" | "secr") {
        return number
            .parse::<f64>()
            .map(|s| s.round() as u32)
            .map_err(|_| ParseError::InvalidRest { text });
    }

    Err(ParseError::InvalidRest { text })
}

fn quantity_value(
    number: &str,
    suffix: &str,
    token: &Token,
) -> Result<(DurationType, u32), ParseError> {
    let text = format!("{}{}", number, suffix);

    if number.contains(':') {
        if !suffix.is_empty() {
            return Err(ParseError::UnknownUnit {
                unit: suffix.to_string(),
                text,
            });
        }
        let tenths = parse_clock_tenths(number).ok_or(ParseError::InvalidTime { text })?;
        return Ok((DurationType::Time, tenths_to_seconds(tenths)));
    }

    let amount: f64 = number.parse().map_err(|_| unexpected(token))?;
    let rounded = |v: f64| v.round() as u32;

    match suffix {
        "m" => Ok((DurationType::Distance, rounded(amount))),
        "km" => Ok((DurationType::Distance, rounded(amount * 1000.0))),
        "cal" | "cals" | "c" | "kcal" => Ok((DurationType::Calories, rounded(amount))),
        "s" | "sec" => Ok((DurationType::Time, rounded(amount))),
        "min" => Ok((DurationType::Time, rounded(amount * 60.0))),
        "" => Err(ParseError::MissingUnit { text }),
        other => Err(ParseError::UnknownUnit {
            unit: other.to_string(),
            text,
        }),
    }
}

// ============================================================================
// Structure building
// ============================================================================

fn build(
    mut segments: Vec<Segment>,
    modality: Option<Modality>,
) -> Result<WorkoutStructure, ParseError> {
    let mut structure = if segments.len() == 1 {
        match segments.remove(0) {
            Segment::Single(c) => with_tags(WorkoutStructure::steady_state(c.work), c.tags),
            Segment::Pair { work, rest } => {
                with_tags(WorkoutStructure::interval(1, work.work, rest), work.tags)
            }
            Segment::Repeat { count, work, rest } => with_tags(
                WorkoutStructure::interval(count, work.work, rest.unwrap_or(0)),
                work.tags,
            ),
            other => variable_from(&[other])?,
        }
    } else {
        variable_from(&segments)?
    };

    structure.modality = modality;
    if let WorkoutShape::Variable(variable) = &mut structure.shape {
        for step in &mut variable.steps {
            step.modality = modality;
        }
    }

    Ok(structure)
}

fn with_tags(mut structure: WorkoutStructure, tags: Vec<String>) -> WorkoutStructure {
    structure.tags = tags;
    structure
}

fn variable_from(segments: &[Segment]) -> Result<WorkoutStructure, ParseError> {
    let mut steps = Vec::new();
    flatten(segments, &mut steps)?;
    Ok(WorkoutStructure::variable(steps))
}

fn push(out: &mut Vec<WorkoutStep>, step: WorkoutStep) -> Result<(), ParseError> {
    if out.len() >= MAX_UNROLLED_STEPS {
        return Err(ParseError::TooManySteps {
            max: MAX_UNROLLED_STEPS,
        });
    }
    out.push(step);
    Ok(())
}

fn flatten(segments: &[Segment], out: &mut Vec<WorkoutStep>) -> Result<(), ParseError> {
    for segment in segments {
        match segment {
            Segment::Single(component) => push(out, component.step())?,
            Segment::Pair { work, rest } => {
                push(out, work.step())?;
                if *rest > 0 {
                    push(out, WorkoutStep::rest(*rest, work.work.block_type))?;
                }
            }
            Segment::Repeat { count, work, rest } => {
                for _ in 0..*count {
                    push(out, work.step())?;
                    if let Some(rest) = rest.filter(|r| *r > 0) {
                        push(out, WorkoutStep::rest(rest, work.work.block_type))?;
                    }
                }
            }
            Segment::Rest {
                seconds,
                block_type,
            } => push(out, WorkoutStep::rest(*seconds, *block_type))?,
            Segment::Group {
                count,
                body,
                rest,
                block_type,
            } => {
                let mut inner = Vec::new();
                flatten(body, &mut inner)?;
                if let Some(block) = block_type {
                    for step in inner.iter_mut().filter(|s| s.block_type.is_main()) {
                        step.block_type = *block;
                    }
                }

                for _ in 0..*count {
                    if out.len() + inner.len() > MAX_UNROLLED_STEPS {
                        return Err(ParseError::TooManySteps {
                            max: MAX_UNROLLED_STEPS,
                        });
                    }
                    out.extend(inner.iter().cloned());
                    if let Some(rest) = rest.filter(|r| *r > 0) {
                        push(out, WorkoutStep::rest(rest, block_type.unwrap_or_default()))?;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedInterval, PaceTarget, ReferencePace, StepKind, TrainingZone};

    fn steps_of(structure: &WorkoutStructure) -> &[WorkoutStep] {
        match &structure.shape {
            WorkoutShape::Variable(v) => &v.steps,
            other => panic!("expected variable workout, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_steady_state_units() {
        let distance = parse("5000m").unwrap();
        assert_eq!(
            distance.shape,
            WorkoutShape::SteadyState(Work::new(DurationType::Distance, 5000))
        );

        let time = parse("30:00").unwrap();
        assert_eq!(
            time.shape,
            WorkoutShape::SteadyState(Work::new(DurationType::Time, 1800))
        );

        let calories = parse("100cal").unwrap();
        assert_eq!(
            calories.shape,
            WorkoutShape::SteadyState(Work::new(DurationType::Calories, 100))
        );

        let hour = parse("1:00:00").unwrap();
        assert_eq!(
            hour.shape,
            WorkoutShape::SteadyState(Work::new(DurationType::Time, 3600))
        );
    }

    #[test]
    fn test_parse_fixed_interval() {
        let structure = parse("4x500m/1:00r").unwrap();
        assert_eq!(
            structure.shape,
            WorkoutShape::Interval(FixedInterval {
                repeats: 4,
                work: Work::new(DurationType::Distance, 500),
                rest_seconds: 60,
            })
        );

        // Whitespace and a detached 'x' are tolerated
        assert_eq!(parse("4 x 500m / 1:00r"), Some(structure));
    }

    #[test]
    fn test_implicit_single_pair() {
        let structure = parse("2000m/5:00r").unwrap();
        match structure.shape {
            WorkoutShape::Interval(fixed) => {
                assert_eq!(fixed.repeats, 1);
                assert_eq!(fixed.rest_seconds, 300);
            }
            other => panic!("expected interval, got {:?}", other),
        }
    }

    #[test]
    fn test_guidance_chaining_is_order_independent() {
        let a = parse("10x500m@2k@32spm/3:00r").unwrap();
        let b = parse("10x500m@32spm@2k/3:00r").unwrap();
        assert_eq!(a, b);

        match a.shape {
            WorkoutShape::Interval(fixed) => {
                assert_eq!(fixed.work.guidance.pace.unwrap().to_string(), "2k");
                assert_eq!(fixed.work.guidance.rate, Some(32));
            }
            other => panic!("expected interval, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_pace_plus_is_not_a_separator() {
        let structure = parse("3x2000m@2k+18/5:00r").unwrap();
        match structure.shape {
            WorkoutShape::Interval(fixed) => {
                assert_eq!(
                    fixed.work.guidance.pace,
                    Some(PaceTarget::Relative {
                        reference: ReferencePace::TwoK,
                        offset_tenths: 180
                    })
                );
            }
            other => panic!("expected interval, got {:?}", other),
        }

        let two = parse("2000m@6k+5 + 10:00@UT2").unwrap();
        let steps = steps_of(&two);
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[1].guidance.pace,
            Some(PaceTarget::Zone(TrainingZone::Ut2))
        );
    }

    #[test]
    fn test_nested_group_unrolls() {
        let structure = parse("3x(750m/3:00r + 500m/3:00r + 250m/6:00r)").unwrap();
        let steps = steps_of(&structure);
        assert_eq!(steps.len(), 18);
        assert_eq!(steps[0].value, 750);
        assert_eq!(steps[5].value, 360);
        assert_eq!(steps[17].kind, StepKind::Rest);
    }

    #[test]
    fn test_group_rest_follows_every_repetition() {
        let structure = parse("2x(4x500m/1:00r)/5:00r").unwrap();
        let steps = steps_of(&structure);
        assert_eq!(steps.len(), 18);
        assert_eq!(steps[8].value, 300);
        assert_eq!(steps[17].value, 300);
    }

    #[test]
    fn test_block_tags_and_legacy_tags() {
        let bracketed = parse("[w]10:00 + 5x500m/1:00r + [c]5:00").unwrap();
        let steps = steps_of(&bracketed);
        assert_eq!(steps.len(), 12);
        assert_eq!(steps[0].block_type, BlockType::Warmup);
        assert_eq!(steps[1].block_type, BlockType::Main);
        assert_eq!(steps[11].block_type, BlockType::Cooldown);

        let legacy = parse("10:00 #warmup + 5x500m/1:00r + 5:00 #cooldown").unwrap();
        assert_eq!(legacy, bracketed);

        let benchmark = parse("2000m #benchmark #pb").unwrap();
        match &benchmark.shape {
            WorkoutShape::SteadyState(work) => assert_eq!(work.block_type, BlockType::Test),
            other => panic!("expected steady state, got {:?}", other),
        }
        assert_eq!(benchmark.tags, vec!["pb".to_string()]);
    }

    #[test]
    fn test_bracket_prefix_wins_over_legacy_tag() {
        let structure = parse("[t]2000m #warmup").unwrap();
        match structure.shape {
            WorkoutShape::SteadyState(work) => assert_eq!(work.block_type, BlockType::Test),
            other => panic!("expected steady state, got {:?}", other),
        }
    }

    #[test]
    fn test_modality_prefix_reattached_to_steps() {
        let structure = parse("Bike: [w]5:00 + 4x1000m/1:00r").unwrap();
        assert_eq!(structure.modality, Some(Modality::Biking));
        assert!(steps_of(&structure)
            .iter()
            .all(|s| s.modality == Some(Modality::Biking)));
    }

    #[test]
    fn test_standalone_rest_segment() {
        let structure = parse("10:00 + 2:00r + 10:00").unwrap();
        let steps = steps_of(&structure);
        assert_eq!(steps.len(), 3);
        assert!(steps[1].is_rest());
        assert_eq!(steps[1].value, 120);
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(parse_notation(""), Err(ParseError::Empty));
        assert_eq!(parse_notation("   "), Err(ParseError::Empty));
        assert!(matches!(parse_notation("4x500m/"), Err(ParseError::MissingRest { .. })));
        assert!(matches!(
            parse_notation("x500m/1:00r"),
            Err(ParseError::MissingRepeatCount { .. })
        ));
        assert!(matches!(parse_notation("5k"), Err(ParseError::UnknownUnit { .. })));
        assert!(matches!(parse_notation("500"), Err(ParseError::MissingUnit { .. })));
        assert_eq!(
            parse_notation("3x(500m/1:00r"),
            Err(ParseError::UnbalancedParens)
        );
        assert_eq!(parse_notation("500m)"), Err(ParseError::UnbalancedParens));
        assert!(matches!(
            parse_notation("500m@fast"),
            Err(ParseError::InvalidGuidance { .. })
        ));
        assert_eq!(parse_notation("0x500m"), Err(ParseError::ZeroRepeats));
        assert!(matches!(
            parse_notation("4x500m/200m"),
            Err(ParseError::InvalidRest { .. })
        ));
        assert!(matches!(parse_notation("1:75"), Err(ParseError::InvalidTime { .. })));
        assert!(matches!(parse_notation("500m + "), Err(ParseError::UnexpectedEnd)));
        assert!(parse("hello world").is_none());
    }

    #[test]
    fn test_nesting_depth_limit() {
        let nested = |depth: usize| {
            format!("{}500m{}", "1x(".repeat(depth), ")".repeat(depth))
        };

        assert!(parse(&nested(DEFAULT_MAX_NESTING_DEPTH)).is_some());
        assert_eq!(
            parse_notation(&nested(DEFAULT_MAX_NESTING_DEPTH + 1)),
            Err(ParseError::NestingTooDeep {
                max: DEFAULT_MAX_NESTING_DEPTH
            })
        );
        assert!(Parser::with_max_depth(2).parse(&nested(3)).is_none());
    }

    #[test]
    fn test_unroll_limit() {
        assert!(matches!(
            parse_notation("100x(100x(100x500m))"),
            Err(ParseError::TooManySteps { .. })
        ));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Row: [w]10:00@UT2 + 3x(4x500m@1:45@r28/1:00r)/5:00r + [c]5:00";
        assert_eq!(parse(text), parse(text));
        assert!(parse(text).is_some());
    }

    #[test]
    fn test_huge_clock_values_do_not_overflow() {
        let work = parse("119304:38:49.5").unwrap();
        assert_eq!(
            work.shape,
            WorkoutShape::SteadyState(Work::new(DurationType::Time, 429_496_729))
        );

        let rested = parse("500m/119304:38:49.5r").unwrap();
        match rested.shape {
            WorkoutShape::Interval(fixed) => assert_eq!(fixed.rest_seconds, 429_496_729),
            other => panic!("expected interval workout, got {:?}", other),
        }
    }
}
