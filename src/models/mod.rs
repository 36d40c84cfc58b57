//! Maintenance classifier loading and inference

pub mod inference;
pub mod loader;

pub use inference::{Classifier, OnnxClassifier};
pub use loader::ModelLoader;
