#![forbid(unsafe_code)]

//! Core notation and naming logic for rowing/erg interval workouts.
//!
//! This crate provides:
//! - Domain types (workout structures, guidance, flat intervals)
//! - Notation tokenizer and recursive-descent parser
//! - Structure/interval adapters and canonical naming
//! - Notation serializer (inverse of the parser)
//! - Warmup/cooldown detection for recorded workouts
//! - Validation, duration estimates and stroke segmentation
//! - Interval file import, configuration and logging

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod lexer;
pub mod guidance;
pub mod parser;
pub mod serializer;
pub mod adapter;
pub mod naming;
pub mod bookends;
pub mod validate;
pub mod estimate;
pub mod strokes;
pub mod import;

// Re-export commonly used types
pub use error::{Error, ParseError, Result};
pub use types::*;
pub use config::Config;
pub use parser::{parse, parse_notation, Parser, DEFAULT_MAX_NESTING_DEPTH};
pub use serializer::to_notation;
pub use adapter::{compute_canonical_name, to_intervals, to_main_intervals};
pub use naming::canonical_name as calculate_canonical_name;
pub use bookends::detect_warmup_cooldown;
pub use validate::{validate, validate_with, ValidationLimits, ValidationResult};
pub use estimate::{estimate_duration, DurationEstimate, EstimateMethod};
pub use strokes::{detect_intervals_from_strokes, StrokeSample};
