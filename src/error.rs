//! Error taxonomy for the pipeline.
//!
//! Only [`BatchError`] ever leaves the assembler. The others are absorbed at
//! field or record level and show up as nulls or metadata counters.

use crate::schema::Field;
use thiserror::Error;

/// Field-level: a malformed value that becomes null.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{field}: not a number: {value:?}")]
    NotNumeric { field: Field, value: String },

    #[error("{field}: value {value} out of range")]
    OutOfRange { field: Field, value: f64 },

    #[error("{field}: unrecognised date {value:?}")]
    BadDate { field: Field, value: String },
}

impl ParseError {
    pub fn field(&self) -> Field {
        match self {
            ParseError::NotNumeric { field, .. }
            | ParseError::OutOfRange { field, .. }
            | ParseError::BadDate { field, .. } => *field,
        }
    }
}

/// Record-level: the record cannot be identified and is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("record {index}: missing designation")]
    MissingDesignation { index: usize },
}

/// Batch-level scaling failure; normalized columns stay unset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalerFitError {
    #[error("no rows to fit")]
    Empty,

    #[error("column {column} has zero variance")]
    ZeroVariance { column: &'static str },

    #[error("column {column} contains a non-finite value")]
    NonFinite { column: &'static str },
}

/// Record-level inference failure; the record falls back to the rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("model produced a non-finite score")]
    NonFinite,

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Fatal: nothing usable came out of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("empty input batch")]
    EmptyInput,

    #[error("all {dropped} records dropped at schema stage")]
    AllRecordsDropped { dropped: usize },
}
