//! Feature derivation: canonical records → days to approach, risk category,
//! filled and scaled numeric columns.

use super::{FeatureRecord, ScaledFeatures, ScalerMode, ScalerState};
use crate::error::ScalerFitError;
use crate::risk::RiskCategory;
use crate::schema::CanonicalRecord;
use chrono::{DateTime, TimeDelta, Utc};

/// Output of one derivation pass. `scaler` is the state actually applied,
/// or why none could be.
#[derive(Debug, Clone)]
pub struct Derived {
    pub records: Vec<FeatureRecord>,
    pub scaler: Result<ScalerState, ScalerFitError>,
}

pub struct FeatureDeriver {
    mode: ScalerMode,
}

impl FeatureDeriver {
    pub fn new(mode: ScalerMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &ScalerMode {
        &self.mode
    }

    pub fn derive(&self, records: Vec<CanonicalRecord>, now: DateTime<Utc>) -> Derived {
        // Fill before scaling so the fit sees the filled values.
        let rows: Vec<[f64; 3]> = records.iter().map(filled_numeric).collect();

        let scaler = match &self.mode {
            ScalerMode::FitPerBatch => ScalerState::fit(&rows),
            ScalerMode::Pretrained(state) => state.validate().map(|_| *state),
        };
        if let Err(e) = &scaler {
            tracing::warn!(error = %e, rows = rows.len(), "scaler unavailable; normalized columns left unset");
        }

        let records = records
            .into_iter()
            .zip(rows)
            .map(|(canonical, row)| {
                let days_until_approach = canonical
                    .close_approach_time
                    .map(|t| days_between(now, t));
                let risk_category = RiskCategory::from_distance(canonical.miss_distance_au);
                let scaled = scaler
                    .as_ref()
                    .ok()
                    .map(|s| ScaledFeatures::from_array(s.transform(row)));
                FeatureRecord {
                    canonical,
                    days_until_approach,
                    risk_category,
                    scaled,
                }
            })
            .collect();

        Derived { records, scaler }
    }
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new(ScalerMode::FitPerBatch)
    }
}

fn filled_numeric(r: &CanonicalRecord) -> [f64; 3] {
    [
        r.relative_velocity_km_s.unwrap_or(0.0),
        r.absolute_magnitude_h.unwrap_or(0.0),
        r.estimated_diameter_km.unwrap_or(0.0),
    ]
}

/// `floor((to - from) / 1 day)`, exact for negative spans.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let days = (to - from).num_days();
    if from + TimeDelta::days(days) > to {
        days - 1
    } else {
        days
    }
}
