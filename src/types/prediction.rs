//! Maintenance verdicts and the records persisted to the prediction log

use crate::error::InferenceError;
use crate::types::reading::MachineReading;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maintenance verdict derived from the classifier's binary label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Required")]
    Required,
    #[serde(rename = "Not Required")]
    NotRequired,
}

impl Verdict {
    /// Map a class label to a verdict: 1 needs maintenance, 0 does not
    pub fn from_label(label: i64) -> Result<Self, InferenceError> {
        match label {
            1 => Ok(Verdict::Required),
            0 => Ok(Verdict::NotRequired),
            other => Err(InferenceError::UnexpectedLabel(other)),
        }
    }

    /// Text written to the `Prediction` column of the log
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Required => "Required",
            Verdict::NotRequired => "Not Required",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, Verdict::Required)
    }

    /// Message shown to the operator
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Required => "Maintenance Required",
            Verdict::NotRequired => "Maintenance Not Required",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the prediction log.
///
/// Field order and names define the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "Serial No.")]
    pub serial_no: u64,
    #[serde(rename = "AirTemp")]
    pub air_temperature_k: f64,
    #[serde(rename = "ProcessTemp")]
    pub process_temperature_k: f64,
    #[serde(rename = "RotSpeed")]
    pub rotational_speed_rpm: i64,
    #[serde(rename = "Torque")]
    pub torque_nm: f64,
    #[serde(rename = "ToolWear")]
    pub tool_wear_min: i64,
    #[serde(rename = "ProductQuality")]
    pub product_quality: i64,
    #[serde(rename = "Prediction")]
    pub prediction: Verdict,
}

impl PredictionRecord {
    /// Build the log row for a reading and its verdict
    pub fn new(serial_no: u64, reading: &MachineReading, prediction: Verdict) -> Self {
        Self {
            serial_no,
            air_temperature_k: reading.air_temperature_k,
            process_temperature_k: reading.process_temperature_k,
            rotational_speed_rpm: reading.rotational_speed_rpm,
            torque_nm: reading.torque_nm,
            tool_wear_min: reading.tool_wear_min,
            product_quality: reading.product_quality,
            prediction,
        }
    }

    /// The reading this row was produced from
    pub fn reading(&self) -> MachineReading {
        MachineReading::new(
            self.air_temperature_k,
            self.process_temperature_k,
            self.rotational_speed_rpm,
            self.torque_nm,
            self.tool_wear_min,
            self.product_quality,
        )
    }
}
