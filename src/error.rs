//! Error types for the liftlog application.

use thiserror::Error;

/// Errors that can occur when parsing the training workbook.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("cannot read file: {0}")]
    CannotRead(String),

    #[error("invalid Excel format: {0}")]
    InvalidFormat(String),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("invalid date format in row {row}: {value}")]
    InvalidDate { row: usize, value: String },

    #[error("invalid weight value in row {row}: {value}")]
    InvalidWeight { row: usize, value: String },

    #[error("invalid repetitions value in row {row}: {value}")]
    InvalidReps { row: usize, value: String },

    #[error("invalid set count in row {row}: {value}")]
    InvalidSets { row: usize, value: String },

    #[error("invalid exercise in row {row}: {value}")]
    InvalidExercise { row: usize, value: String },

    #[error("unknown equipment in row {row}: {value}")]
    UnknownEquipment { row: usize, value: String },
}

/// Caller contract violations in the estimation engine.
///
/// These are never retried or corrected; an empty suggestion list or a
/// degenerate trend is a valid result, not one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("target repetitions must be positive: {0}")]
    InvalidReps(u32),

    #[error("weight must be a non-negative number: {0}")]
    InvalidWeight(f64),

    #[error("invalid {name} range: min {min}, max {max}")]
    InvalidRange {
        name: &'static str,
        min: u32,
        max: u32,
    },

    #[error("weight increment must be positive: {0}")]
    InvalidIncrement(f64),

    #[error("search grid of {cells} candidates exceeds the limit of {limit}")]
    GridTooLarge { cells: f64, limit: usize },
}

/// Errors that can occur when writing to the training workbook.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("cannot open workbook: {0}")]
    Read(String),

    #[error("cannot save workbook: {0}")]
    Write(String),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("log sheet is missing column: {0}")]
    MissingColumn(String),
}
