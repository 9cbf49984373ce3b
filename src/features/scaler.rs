//! Min-max scaling over velocity, magnitude and diameter.
//!
//! The scaler is an explicit value: either fit on the current batch or loaded
//! from the model artifact. Nothing here is global.

use crate::error::ScalerFitError;
use serde::{Deserialize, Serialize};

/// Columns covered by the scaler, in order.
pub const SCALED_COLUMNS: [&str; 3] = [
    "relative_velocity_km_s",
    "absolute_magnitude_h",
    "estimated_diameter_km",
];

/// Fitted per-column bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl ScalerState {
    /// Fit jointly over all rows. Fails on an empty batch, a non-finite value
    /// or a column whose values are all equal.
    pub fn fit(rows: &[[f64; 3]]) -> Result<Self, ScalerFitError> {
        if rows.is_empty() {
            return Err(ScalerFitError::Empty);
        }
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for row in rows {
            for (i, &v) in row.iter().enumerate() {
                if !v.is_finite() {
                    return Err(ScalerFitError::NonFinite {
                        column: SCALED_COLUMNS[i],
                    });
                }
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }
        let state = Self { min, max };
        state.validate()?;
        Ok(state)
    }

    /// Check bounds loaded from elsewhere are usable.
    pub fn validate(&self) -> Result<(), ScalerFitError> {
        for i in 0..3 {
            let column = SCALED_COLUMNS[i];
            if !self.min[i].is_finite() || !self.max[i].is_finite() {
                return Err(ScalerFitError::NonFinite { column });
            }
            if self.max[i] <= self.min[i] {
                return Err(ScalerFitError::ZeroVariance { column });
            }
        }
        Ok(())
    }

    /// Scale one row into [0, 1]. Values outside the fitted range are clamped.
    pub fn transform(&self, row: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for i in 0..3 {
            let span = self.max[i] - self.min[i];
            out[i] = ((row[i] - self.min[i]) / span).clamp(0.0, 1.0);
        }
        out
    }
}

/// Where the scaler for a batch comes from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScalerMode {
    #[default]
    FitPerBatch,
    /// Training-time bounds; never re-fit.
    Pretrained(ScalerState),
}

/// Outcome recorded in dataset metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScalerStatus {
    Fitted,
    Pretrained,
    Failed { reason: String },
}

impl ScalerStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ScalerStatus::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_and_transform() {
        let s = ScalerState::fit(&[[10.0, 20.0, 0.0], [20.0, 25.0, 1.0], [15.0, 30.0, 0.5]]).unwrap();
        assert_eq!(s.min, [10.0, 20.0, 0.0]);
        assert_eq!(s.max, [20.0, 30.0, 1.0]);
        assert_eq!(s.transform([15.0, 20.0, 1.0]), [0.5, 0.0, 1.0]);
    }

    #[test]
    fn fit_is_order_independent() {
        let a = ScalerState::fit(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let b = ScalerState::fit(&[[4.0, 5.0, 6.0], [1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_batches_fail() {
        assert_eq!(ScalerState::fit(&[]), Err(ScalerFitError::Empty));
        assert_eq!(
            ScalerState::fit(&[[1.0, 2.0, 3.0]]),
            Err(ScalerFitError::ZeroVariance {
                column: "relative_velocity_km_s"
            })
        );
        assert_eq!(
            ScalerState::fit(&[[1.0, 2.0, 0.0], [2.0, 3.0, 0.0]]),
            Err(ScalerFitError::ZeroVariance {
                column: "estimated_diameter_km"
            })
        );
    }

    #[test]
    fn pretrained_transform_clamps() {
        let s = ScalerState {
            min: [0.0, 10.0, 0.0],
            max: [10.0, 30.0, 2.0],
        };
        assert_eq!(s.transform([20.0, 5.0, 1.0]), [1.0, 0.0, 0.5]);
    }
}
