//! MachineGuard Library
//!
//! Industrial machine failure prediction: validates sensor readings, asks a
//! pre-trained classifier whether maintenance is required and keeps an
//! append-only CSV log of every verdict.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod http;
pub mod metrics;
pub mod models;
pub mod prediction_log;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use error::{InferenceError, LogError, PredictionError, ValidationError};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::{Classifier, OnnxClassifier};
pub use prediction_log::PredictionLog;
pub use service::{LogOutcome, PredictionOutcome, PredictionService};
pub use types::{MachineReading, PredictionRecord, ProductQuality, Verdict};
