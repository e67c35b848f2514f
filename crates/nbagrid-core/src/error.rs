//! Error types for the grid engine.
//!
//! - `ConfigError`: malformed filter configuration, bounds or engine settings
//! - `TransportError`: a rejected import document
//! - `StoreError`: failures of the persistence and provider collaborators
//! - `GridError`: everything a caller of the engine can see

use crate::grid::{Axis, Slot};
use crate::validator::Violation;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid filter, bounds or engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown filter kind '{0}'")]
    UnknownKind(String),

    #[error("filter '{kind}' expects {expected} configuration")]
    WrongShape { kind: String, expected: &'static str },

    #[error("value {value} for '{kind}' is outside {min}..={max}")]
    OutOfRange {
        kind: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("value {value} for '{kind}' is not on the {step}-step grid starting at {min}")]
    OffStep {
        kind: String,
        value: i64,
        min: i64,
        step: i64,
    },

    #[error("malformed configuration for '{kind}': {reason}")]
    MalformedConfig { kind: String, reason: String },

    #[error("'{value}' is not an option for '{kind}'")]
    UnknownOption { kind: String, value: String },

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("invalid engine setting: {0}")]
    InvalidSetting(String),

    #[error("catalog needs at least {needed} filter kinds, found {found}")]
    CatalogTooSmall { needed: usize, found: usize },

    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Rejected import document. Imports are all-or-nothing.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("malformed grid document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("grid document is missing the {0} axis")]
    MissingAxis(Axis),

    #[error("grid document is missing {axis} slot {index}")]
    MissingSlot { axis: Axis, index: usize },

    #[error("grid document has unexpected {axis} slot {index}")]
    UnexpectedSlot { axis: Axis, index: usize },

    #[error("{axis} slot {index}: {source}")]
    InvalidSlot {
        axis: Axis,
        index: usize,
        source: ConfigError,
    },

    #[error("{axis} slot {index}: label '{found}' does not match configuration (expected '{expected}')")]
    LabelMismatch {
        axis: Axis,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("title is {len} characters, at most {max} allowed")]
    TitleTooLong { len: usize, max: usize },
}

/// Failure of a store or provider collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store is unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Top-level engine error.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("grid violates {} constraint(s): {}", .violations.len(), summarize(.violations))]
    Invalid { violations: Vec<Violation> },

    #[error("no grid could be assembled after {full_resamples} full resample(s) and {repairs} repair(s)")]
    Exhausted { full_resamples: usize, repairs: usize },

    #[error("grid build cancelled after {full_resamples} full resample(s)")]
    Cancelled { full_resamples: usize },

    #[error("grid is incomplete, missing: {}", list_slots(.missing))]
    IncompleteGrid { missing: Vec<Slot> },

    #[error("slot {0} is outside the 3x3 grid")]
    SlotOutOfRange(Slot),

    #[error("cell ({row}, {col}) is outside the 3x3 grid")]
    CellOutOfRange { row: usize, col: usize },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GridError {
    /// Whether the error means the search gave up, as opposed to bad input.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Cancelled { .. })
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn list_slots(slots: &[Slot]) -> String {
    slots
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, GridError>;
