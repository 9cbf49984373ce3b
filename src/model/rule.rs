//! Deterministic fallback classifier.

use crate::risk::{HAZARD_DIAMETER_KM, HAZARD_DISTANCE_AU};
use crate::schema::CanonicalRecord;

/// Hazardous iff closer than 0.01 AU and larger than 0.15 km.
/// Unknown distance or diameter is never hazardous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleClassifier;

impl RuleClassifier {
    pub fn is_hazardous(&self, record: &CanonicalRecord) -> bool {
        match (record.miss_distance_au, record.estimated_diameter_km) {
            (Some(dist), Some(diameter)) => {
                dist < HAZARD_DISTANCE_AU && diameter > HAZARD_DIAMETER_KM
            }
            _ => false,
        }
    }
}
