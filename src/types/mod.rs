//! Type definitions for machine readings and prediction records

pub mod prediction;
pub mod reading;

pub use prediction::{PredictionRecord, Verdict};
pub use reading::{MachineReading, ProductQuality};
