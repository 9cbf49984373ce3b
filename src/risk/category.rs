//! Maps miss distance onto a coarse risk category.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this (AU) an approach is `close`.
pub const CLOSE_DISTANCE_AU: f64 = 0.01;
/// Below this (AU) an approach is `medium`, otherwise `far`.
pub const MEDIUM_DISTANCE_AU: f64 = 0.1;

/// Rule classifier: hazardous when strictly closer than this (AU)...
pub const HAZARD_DISTANCE_AU: f64 = 0.01;
/// ...and strictly larger than this (km).
pub const HAZARD_DIAMETER_KM: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Close,
    Medium,
    Far,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 3] = [RiskCategory::Close, RiskCategory::Medium, RiskCategory::Far];

    /// Lower bounds inclusive, upper bounds exclusive. Unknown distance is `Far`.
    pub fn from_distance(miss_distance_au: Option<f64>) -> Self {
        match miss_distance_au {
            Some(d) if d < CLOSE_DISTANCE_AU => RiskCategory::Close,
            Some(d) if d < MEDIUM_DISTANCE_AU => RiskCategory::Medium,
            _ => RiskCategory::Far,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Close => "close",
            RiskCategory::Medium => "medium",
            RiskCategory::Far => "far",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_half_open() {
        assert_eq!(RiskCategory::from_distance(Some(0.0)), RiskCategory::Close);
        assert_eq!(RiskCategory::from_distance(Some(0.0099)), RiskCategory::Close);
        assert_eq!(RiskCategory::from_distance(Some(0.01)), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_distance(Some(0.0999)), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_distance(Some(0.1)), RiskCategory::Far);
        assert_eq!(RiskCategory::from_distance(Some(3.5)), RiskCategory::Far);
    }

    #[test]
    fn unknown_distance_is_far() {
        assert_eq!(RiskCategory::from_distance(None), RiskCategory::Far);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskCategory::Medium).unwrap(), "\"medium\"");
        assert_eq!(RiskCategory::Close.to_string(), "close");
    }
}
