//! Derived features: time to approach, risk category, scaled numeric columns,
//! and the fixed-order vector handed to the model.

mod pipeline;
mod scaler;

pub use pipeline::{days_between, Derived, FeatureDeriver};
pub use scaler::{ScalerMode, ScalerState, ScalerStatus, SCALED_COLUMNS};

use crate::risk::RiskCategory;
use crate::schema::CanonicalRecord;
use serde::{Deserialize, Serialize};

/// Bumped whenever [`FeatureVector::ORDER`] changes. Model artifacts record
/// the version they were trained against.
pub const FEATURE_ORDER_VERSION: u32 = 1;

/// Min-max scaled copies of the three numeric columns, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledFeatures {
    pub relative_velocity_km_s: f64,
    pub absolute_magnitude_h: f64,
    pub estimated_diameter_km: f64,
}

impl ScaledFeatures {
    pub fn from_array(v: [f64; 3]) -> Self {
        Self {
            relative_velocity_km_s: v[0],
            absolute_magnitude_h: v[1],
            estimated_diameter_km: v[2],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(flatten)]
    pub canonical: CanonicalRecord,
    /// Signed whole days from the reference time; negative once passed.
    pub days_until_approach: Option<i64>,
    pub risk_category: RiskCategory,
    /// Unset when the batch scaler could not be fit.
    pub scaled: Option<ScaledFeatures>,
}

/// Model input, in training order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub relative_velocity_km_s: f64,
    pub absolute_magnitude_h: f64,
    pub estimated_diameter_km: f64,
    pub days_until_approach: f64,
}

impl FeatureVector {
    pub const DIM: usize = 4;

    pub const ORDER: [&'static str; Self::DIM] = [
        "relative_velocity_km_s",
        "absolute_magnitude_h",
        "estimated_diameter_km",
        "days_until_approach",
    ];

    /// Scaled numeric columns plus unscaled days. Anything missing is 0.0,
    /// matching the training-time fill.
    pub fn from_record(record: &FeatureRecord) -> Self {
        let scaled = record.scaled;
        Self {
            relative_velocity_km_s: scaled.map_or(0.0, |s| s.relative_velocity_km_s),
            absolute_magnitude_h: scaled.map_or(0.0, |s| s.absolute_magnitude_h),
            estimated_diameter_km: scaled.map_or(0.0, |s| s.estimated_diameter_km),
            days_until_approach: record.days_until_approach.map_or(0.0, |d| d as f64),
        }
    }

    pub fn to_array(&self) -> [f64; Self::DIM] {
        [
            self.relative_velocity_km_s,
            self.absolute_magnitude_h,
            self.estimated_diameter_km,
            self.days_until_approach,
        ]
    }

    pub fn to_f32(&self) -> [f32; Self::DIM] {
        self.to_array().map(|v| v as f32)
    }
}
