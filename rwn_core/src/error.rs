//! Error types for the rwn_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for rwn_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notation could not be parsed
    #[error("Notation error: {0}")]
    Parse(#[from] ParseError),

    /// Interval or stroke file could not be interpreted
    #[error("Import error: {0}")]
    Import(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Why a notation string failed to parse.
///
/// `parse` collapses all of these to `None`; `validate` turns them into
/// user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("notation is empty")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected '{found}' at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("notation ended unexpectedly")]
    UnexpectedEnd,

    #[error("unknown unit '{unit}' in '{text}'")]
    UnknownUnit { unit: String, text: String },

    #[error("'{text}' has no unit (use m, m:ss or cal)")]
    MissingUnit { text: String },

    #[error("missing repeat count before 'x' at position {pos}")]
    MissingRepeatCount { pos: usize },

    #[error("missing rest duration after '/' at position {pos}")]
    MissingRest { pos: usize },

    #[error("rest must be a time like 1:00r, got '{text}'")]
    InvalidRest { text: String },

    #[error("repeat count must be at least 1")]
    ZeroRepeats,

    #[error("invalid time '{text}'")]
    InvalidTime { text: String },

    #[error("unrecognized guidance '@{text}'")]
    InvalidGuidance { text: String },

    #[error("groups nested deeper than {max} levels")]
    NestingTooDeep { max: usize },

    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("workout expands to more than {max} steps")]
    TooManySteps { max: usize },
}
