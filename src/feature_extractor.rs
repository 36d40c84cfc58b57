//! Feature extraction for the maintenance classifier.
//!
//! The classifier was trained on the raw readings in a fixed column order;
//! no scaling or engineered features are applied here.

use crate::types::reading::MachineReading;

/// Number of model input features
pub const FEATURE_COUNT: usize = 6;

/// One model input row
pub type FeatureVector = [f32; FEATURE_COUNT];

/// Feature extractor that turns readings into model input rows.
///
/// Column order must match the order the classifier was trained on.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature row for a reading.
    ///
    /// Order: air temperature, process temperature, rotational speed,
    /// torque, tool wear, product quality.
    pub fn extract(&self, reading: &MachineReading) -> FeatureVector {
        [
            reading.air_temperature_k as f32,
            reading.process_temperature_k as f32,
            reading.rotational_speed_rpm as f32,
            reading.torque_nm as f32,
            reading.tool_wear_min as f32,
            reading.product_quality as f32,
        ]
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names, matching the prediction log columns.
    pub fn feature_names(&self) -> [&'static str; FEATURE_COUNT] {
        [
            "AirTemp",
            "ProcessTemp",
            "RotSpeed",
            "Torque",
            "ToolWear",
            "ProductQuality",
        ]
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order() {
        let extractor = FeatureExtractor::new();
        let reading = MachineReading::new(300.0, 310.0, 1500, 40.0, 10, 1);

        let features = extractor.extract(&reading);

        assert_eq!(features, [300.0, 310.0, 1500.0, 40.0, 10.0, 1.0]);
    }

    #[test]
    fn test_feature_count() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.feature_count(), 6);
        assert_eq!(extractor.feature_names().len(), 6);
        assert_eq!(extractor.feature_names()[5], "ProductQuality");
    }
}
