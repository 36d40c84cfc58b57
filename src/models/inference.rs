//! Classifier abstraction and the ONNX Runtime implementation

use crate::config::ModelConfig;
use crate::error::InferenceError;
use crate::feature_extractor::{FeatureVector, FEATURE_COUNT};
use crate::models::loader::{LoadedModel, ModelLoader};
use anyhow::Result;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// A pre-trained binary classifier.
///
/// `predict` receives `n` feature rows and must return `n` class labels.
/// Labels are passed through untouched; mapping them to verdicts (and
/// rejecting anything outside {0, 1}) is the caller's job.
pub trait Classifier: Send + Sync {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>, InferenceError>;

    /// Name used in logs and the health endpoint
    fn name(&self) -> &str;
}

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    name: String,
    /// Session `run` needs exclusive access
    model: Mutex<LoadedModel>,
}

impl OnnxClassifier {
    /// Load the classifier described by the model configuration
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        Self::load_with(&loader, &config.path)
    }

    /// Load a classifier from a path using an existing loader
    pub fn load_with<P: AsRef<Path>>(loader: &ModelLoader, path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "classifier".to_string());

        let model = loader.load_model(path, &name)?;
        info!(model = %name, "Classifier ready");

        Ok(Self {
            name,
            model: Mutex::new(model),
        })
    }

    fn run(&self, rows: &[FeatureVector]) -> Result<Vec<i64>, InferenceError> {
        use ort::value::Tensor;

        // Shape [n_rows, 6], row-major
        let shape = vec![rows.len() as i64, FEATURE_COUNT as i64];
        let data: Vec<f32> = rows.iter().flatten().copied().collect();
        let input_tensor =
            Tensor::from_array((shape, data)).map_err(InferenceError::runtime)?;

        let mut model = self
            .model
            .lock()
            .map_err(|e| InferenceError::runtime(format!("Lock error: {}", e)))?;
        let LoadedModel {
            session,
            input_name,
            label_name,
        } = &mut *model;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(InferenceError::runtime)?;

        let output = outputs.get(label_name.as_str()).ok_or_else(|| {
            InferenceError::runtime(format!("Model output '{}' missing", label_name))
        })?;

        if let Ok((_, labels)) = output.try_extract_tensor::<i64>() {
            return Ok(labels.to_vec());
        }

        // Some exporters emit labels as floats
        let (_, labels) = output
            .try_extract_tensor::<f32>()
            .map_err(InferenceError::runtime)?;
        labels.iter().map(|&label| integral_label(label)).collect()
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<i64>, InferenceError> {
        let labels = self.run(rows)?;

        debug!(
            model = %self.name,
            rows = rows.len(),
            labels = ?labels,
            "Inference complete"
        );

        Ok(labels)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Convert a float label to an integer class, rejecting fractional values
fn integral_label(label: f32) -> Result<i64, InferenceError> {
    if label.is_finite() && label.fract() == 0.0 {
        Ok(label as i64)
    } else {
        Err(InferenceError::NonIntegralLabel(label))
    }
}
