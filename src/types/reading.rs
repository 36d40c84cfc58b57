//! Machine sensor readings submitted for a maintenance prediction

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Accepted air temperature in Kelvin
pub const AIR_TEMPERATURE_K: RangeInclusive<f64> = 200.0..=500.0;
/// Accepted process temperature in Kelvin
pub const PROCESS_TEMPERATURE_K: RangeInclusive<f64> = 200.0..=500.0;
/// Accepted spindle speed in rpm
pub const ROTATIONAL_SPEED_RPM: RangeInclusive<i64> = 0..=5000;
/// Accepted torque in Nm
pub const TORQUE_NM: RangeInclusive<f64> = 0.0..=100.0;
/// Accepted cumulative tool wear in minutes
pub const TOOL_WEAR_MIN: RangeInclusive<i64> = 0..=500;

/// Product quality variant of the machined part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductQuality {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl ProductQuality {
    pub const ALL: [ProductQuality; 3] = [Self::Low, Self::Medium, Self::High];

    /// Integer code the classifier was trained on
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Label shown in the input form
    pub fn label(self) -> &'static str {
        match self {
            ProductQuality::Low => "Low (0)",
            ProductQuality::Medium => "Medium (1)",
            ProductQuality::High => "High (2)",
        }
    }
}

impl TryFrom<i64> for ProductQuality {
    type Error = ValidationError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ProductQuality::Low),
            1 => Ok(ProductQuality::Medium),
            2 => Ok(ProductQuality::High),
            other => Err(ValidationError::UnknownProductQuality(other)),
        }
    }
}

impl From<ProductQuality> for i64 {
    fn from(quality: ProductQuality) -> Self {
        quality.code()
    }
}

impl fmt::Display for ProductQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One set of sensor readings for a single machine.
///
/// Integer fields are wide and signed so that nonsense submissions such as a
/// negative speed survive deserialization and are reported by [`validate`].
///
/// [`validate`]: MachineReading::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineReading {
    /// Air temperature [K]
    pub air_temperature_k: f64,
    /// Process temperature [K]
    pub process_temperature_k: f64,
    /// Rotational speed [rpm]
    pub rotational_speed_rpm: i64,
    /// Torque [Nm]
    pub torque_nm: f64,
    /// Tool wear [min]
    pub tool_wear_min: i64,
    /// Product quality code (0 = Low, 1 = Medium, 2 = High)
    pub product_quality: i64,
}

impl MachineReading {
    /// Create a reading from its six fields
    pub fn new(
        air_temperature_k: f64,
        process_temperature_k: f64,
        rotational_speed_rpm: i64,
        torque_nm: f64,
        tool_wear_min: i64,
        product_quality: i64,
    ) -> Self {
        Self {
            air_temperature_k,
            process_temperature_k,
            rotational_speed_rpm,
            torque_nm,
            tool_wear_min,
            product_quality,
        }
    }

    /// Check every field against its accepted domain.
    ///
    /// Fields are checked in feature order and the first violation is
    /// returned. NaN and infinite floats are rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_float("air_temperature_k", self.air_temperature_k, AIR_TEMPERATURE_K)?;
        check_float(
            "process_temperature_k",
            self.process_temperature_k,
            PROCESS_TEMPERATURE_K,
        )?;
        check_int(
            "rotational_speed_rpm",
            self.rotational_speed_rpm,
            ROTATIONAL_SPEED_RPM,
        )?;
        check_float("torque_nm", self.torque_nm, TORQUE_NM)?;
        check_int("tool_wear_min", self.tool_wear_min, TOOL_WEAR_MIN)?;
        ProductQuality::try_from(self.product_quality)?;
        Ok(())
    }
}

impl Default for MachineReading {
    /// Form defaults: a cool, lightly worn machine at nominal speed
    fn default() -> Self {
        Self::new(300.0, 300.0, 1500, 40.0, 10, ProductQuality::Low.code())
    }
}

fn check_float(
    field: &'static str,
    value: f64,
    range: RangeInclusive<f64>,
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if !range.contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(())
}

fn check_int(
    field: &'static str,
    value: i64,
    range: RangeInclusive<i64>,
) -> Result<(), ValidationError> {
    if !range.contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value: value as f64,
            min: *range.start() as f64,
            max: *range.end() as f64,
        });
    }
    Ok(())
}
