//! Error types for prediction requests and the prediction log.
//!
//! Startup failures (configuration, model loading) are reported through
//! `anyhow`; everything that can happen while serving a request is typed here.

use std::path::PathBuf;
use thiserror::Error;

/// A submitted reading is outside the accepted domain.
///
/// Raised before inference; nothing is sent to the model and nothing is logged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A numeric field is outside its inclusive range.
    #[error("Field '{field}' value {value} is out of bounds [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A float field is NaN or infinite.
    #[error("Field '{field}' must be a finite number")]
    NotFinite { field: &'static str },

    /// Product quality code is not one of 0 (Low), 1 (Medium), 2 (High).
    #[error("Unknown product quality {0}, expected 0 (Low), 1 (Medium) or 2 (High)")]
    UnknownProductQuality(i64),
}

/// The classifier failed or produced an unusable answer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InferenceError {
    /// Label outside {0, 1}.
    #[error("Classifier returned unexpected label {0}")]
    UnexpectedLabel(i64),

    /// Label output is a float that is not a whole number.
    #[error("Classifier returned non-integral label {0}")]
    NonIntegralLabel(f32),

    /// Number of labels does not match the number of rows submitted.
    #[error("Classifier returned {actual} labels for {expected} rows")]
    LabelCount { expected: usize, actual: usize },

    /// Model runtime failure.
    #[error("Classifier failed: {0}")]
    Runtime(String),
}

impl InferenceError {
    pub fn runtime(err: impl std::fmt::Display) -> Self {
        Self::Runtime(err.to_string())
    }
}

/// Appending to or reading the prediction log failed.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Prediction log I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prediction log CSV error at {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Why a prediction request produced no verdict.
///
/// Log failures are not represented here; they never cancel a verdict.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Invalid reading: {0}")]
    Validation(#[from] ValidationError),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
}

impl PredictionError {
    /// Short machine readable category
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::Validation(_) => "validation",
            PredictionError::Inference(_) => "inference",
        }
    }
}
