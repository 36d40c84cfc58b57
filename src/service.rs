//! Prediction service: validate a reading, ask the classifier, log the verdict.

use crate::config::AppConfig;
use crate::error::{InferenceError, LogError, PredictionError};
use crate::feature_extractor::FeatureExtractor;
use crate::metrics::ServiceMetrics;
use crate::models::inference::{Classifier, OnnxClassifier};
use crate::prediction_log::PredictionLog;
use crate::types::prediction::{PredictionRecord, Verdict};
use crate::types::reading::MachineReading;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened to the log row for a verdict
#[derive(Debug)]
pub enum LogOutcome {
    /// Row appended with this serial number
    Appended { serial_no: u64 },
    /// Append failed; the verdict still stands
    Failed(LogError),
}

/// Result of a served prediction
#[derive(Debug)]
pub struct PredictionOutcome {
    pub verdict: Verdict,
    pub reading: MachineReading,
    pub log: LogOutcome,
}

impl PredictionOutcome {
    /// Serial number of the log row, if it was written
    pub fn serial_no(&self) -> Option<u64> {
        match self.log {
            LogOutcome::Appended { serial_no } => Some(serial_no),
            LogOutcome::Failed(_) => None,
        }
    }

    pub fn log_error(&self) -> Option<&LogError> {
        match &self.log {
            LogOutcome::Appended { .. } => None,
            LogOutcome::Failed(e) => Some(e),
        }
    }
}

/// Serves maintenance predictions and records them in the prediction log
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    extractor: FeatureExtractor,
    log: PredictionLog,
    metrics: Arc<ServiceMetrics>,
}

impl PredictionService {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        log: PredictionLog,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            classifier,
            extractor: FeatureExtractor::new(),
            log,
            metrics,
        }
    }

    /// Load the configured model and open the configured log.
    ///
    /// Fails when the model cannot be loaded; the service must not start
    /// without one.
    pub fn from_config(config: &AppConfig, metrics: Arc<ServiceMetrics>) -> Result<Self> {
        let classifier = OnnxClassifier::load(&config.model)
            .with_context(|| format!("Failed to load classifier from {}", config.model.path))?;
        let log = PredictionLog::new(&config.prediction_log.path);

        info!(
            model = %classifier.name(),
            log = %log.path().display(),
            "Prediction service initialized"
        );

        Ok(Self::new(Arc::new(classifier), log, metrics))
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Validate a reading, classify it and append the verdict to the log.
    ///
    /// Invalid readings never reach the classifier, and failed inferences
    /// write nothing. The append is attempted exactly once; if it fails the
    /// verdict is still returned with [`LogOutcome::Failed`].
    pub fn predict_and_log(
        &self,
        reading: &MachineReading,
    ) -> Result<PredictionOutcome, PredictionError> {
        let start_time = Instant::now();

        if let Err(e) = reading.validate() {
            self.metrics.record_rejection();
            debug!(error = %e, "Reading rejected");
            return Err(e.into());
        }

        let verdict = match self.classify(reading) {
            Ok(verdict) => verdict,
            Err(e) => {
                self.metrics.record_inference_failure();
                warn!(model = %self.classifier.name(), error = %e, "Inference failed");
                return Err(e.into());
            }
        };

        let log = match self.log.append(reading, verdict) {
            Ok(serial_no) => LogOutcome::Appended { serial_no },
            Err(e) => {
                self.metrics.record_log_failure();
                warn!(
                    path = %self.log.path().display(),
                    error = %e,
                    verdict = %verdict,
                    "Failed to append prediction to log"
                );
                LogOutcome::Failed(e)
            }
        };

        let processing_time = start_time.elapsed();
        self.metrics
            .record_prediction(processing_time, verdict.is_required());

        let outcome = PredictionOutcome {
            verdict,
            reading: reading.clone(),
            log,
        };

        info!(
            verdict = %verdict,
            serial_no = ?outcome.serial_no(),
            processing_time_us = processing_time.as_micros(),
            "Prediction served"
        );

        Ok(outcome)
    }

    /// Every record in the prediction log
    pub fn history(&self) -> Result<Vec<PredictionRecord>, LogError> {
        self.log.read_all()
    }

    fn classify(&self, reading: &MachineReading) -> Result<Verdict, InferenceError> {
        let features = self.extractor.extract(reading);
        let labels = self.classifier.predict(&[features])?;

        match labels.as_slice() {
            [label] => Verdict::from_label(*label),
            _ => Err(InferenceError::LabelCount {
                expected: 1,
                actual: labels.len(),
            }),
        }
    }
}
