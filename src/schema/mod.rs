//! Raw and canonical close-approach records.
//! Raw feeds arrive with inconsistent key casing; the normalizer maps them onto
//! a fixed schema once, before anything else looks at them.

mod normalizer;

pub use normalizer::{normalize, normalize_with_report, parse_approach_time, NormalizeOutput};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scalar as received from the catalog feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Null,
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// One record as fetched: field name (any casing, stray whitespace) to scalar.
pub type RawRecord = BTreeMap<String, RawValue>;

/// Build a [`RawRecord`] from `(key, value)` pairs.
pub fn raw_record<K, V, I>(pairs: I) -> RawRecord
where
    K: Into<String>,
    V: Into<RawValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Canonical fields and the raw keys they are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Designation,
    FullName,
    CloseApproachTime,
    MissDistanceAu,
    RelativeVelocityKmS,
    EstimatedDiameterKm,
    AbsoluteMagnitudeH,
}

impl Field {
    /// Lookup by an already lower-cased, trimmed raw key.
    pub fn from_raw_key(key: &str) -> Option<Self> {
        match key {
            "des" => Some(Field::Designation),
            "fullname" => Some(Field::FullName),
            "cd" => Some(Field::CloseApproachTime),
            "dist" => Some(Field::MissDistanceAu),
            "v_rel" => Some(Field::RelativeVelocityKmS),
            "diameter" => Some(Field::EstimatedDiameterKm),
            "h" => Some(Field::AbsoluteMagnitudeH),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Field::Designation => "designation",
            Field::FullName => "full_name",
            Field::CloseApproachTime => "close_approach_time",
            Field::MissDistanceAu => "miss_distance_au",
            Field::RelativeVelocityKmS => "relative_velocity_km_s",
            Field::EstimatedDiameterKm => "estimated_diameter_km",
            Field::AbsoluteMagnitudeH => "absolute_magnitude_h",
        }
    }

    /// Physical quantities that cannot be negative.
    pub fn non_negative(&self) -> bool {
        matches!(
            self,
            Field::MissDistanceAu | Field::RelativeVelocityKmS | Field::EstimatedDiameterKm
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub designation: String,
    pub full_name: String,
    pub close_approach_time: Option<DateTime<Utc>>,
    pub miss_distance_au: Option<f64>,
    pub relative_velocity_km_s: Option<f64>,
    pub estimated_diameter_km: Option<f64>,
    pub absolute_magnitude_h: Option<f64>,
}

impl CanonicalRecord {
    pub fn new(designation: impl Into<String>) -> Self {
        Self {
            designation: designation.into(),
            full_name: String::new(),
            close_approach_time: None,
            miss_distance_au: None,
            relative_velocity_km_s: None,
            estimated_diameter_km: None,
            absolute_magnitude_h: None,
        }
    }

    /// Identity of one approach event.
    pub fn key(&self) -> (&str, Option<DateTime<Utc>>) {
        (self.designation.as_str(), self.close_approach_time)
    }

    pub fn is_null(&self, field: Field) -> bool {
        match field {
            Field::Designation => false,
            Field::FullName => self.full_name.is_empty(),
            Field::CloseApproachTime => self.close_approach_time.is_none(),
            Field::MissDistanceAu => self.miss_distance_au.is_none(),
            Field::RelativeVelocityKmS => self.relative_velocity_km_s.is_none(),
            Field::EstimatedDiameterKm => self.estimated_diameter_km.is_none(),
            Field::AbsoluteMagnitudeH => self.absolute_magnitude_h.is_none(),
        }
    }
}

/// Per-field counters for the nullable columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCounts {
    pub close_approach_time: usize,
    pub miss_distance_au: usize,
    pub relative_velocity_km_s: usize,
    pub estimated_diameter_km: usize,
    pub absolute_magnitude_h: usize,
}

impl FieldCounts {
    pub const FIELDS: [Field; 5] = [
        Field::CloseApproachTime,
        Field::MissDistanceAu,
        Field::RelativeVelocityKmS,
        Field::EstimatedDiameterKm,
        Field::AbsoluteMagnitudeH,
    ];

    pub fn bump(&mut self, field: Field) {
        match field {
            Field::CloseApproachTime => self.close_approach_time += 1,
            Field::MissDistanceAu => self.miss_distance_au += 1,
            Field::RelativeVelocityKmS => self.relative_velocity_km_s += 1,
            Field::EstimatedDiameterKm => self.estimated_diameter_km += 1,
            Field::AbsoluteMagnitudeH => self.absolute_magnitude_h += 1,
            Field::Designation | Field::FullName => {}
        }
    }

    pub fn get(&self, field: Field) -> usize {
        match field {
            Field::CloseApproachTime => self.close_approach_time,
            Field::MissDistanceAu => self.miss_distance_au,
            Field::RelativeVelocityKmS => self.relative_velocity_km_s,
            Field::EstimatedDiameterKm => self.estimated_diameter_km,
            Field::AbsoluteMagnitudeH => self.absolute_magnitude_h,
            Field::Designation | Field::FullName => 0,
        }
    }

    /// Count nulls per field over a set of records.
    pub fn nulls<'a>(records: impl IntoIterator<Item = &'a CanonicalRecord>) -> Self {
        let mut counts = Self::default();
        for r in records {
            for field in Self::FIELDS {
                if r.is_null(field) {
                    counts.bump(field);
                }
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        Self::FIELDS.iter().map(|f| self.get(*f)).sum()
    }
}
