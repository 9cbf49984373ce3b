//! Raw records → canonical records. Pure; output order follows input order.

use super::{CanonicalRecord, Field, FieldCounts, RawRecord, RawValue};
use crate::error::{ParseError, SchemaError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%b-%d %H:%M",
    "%Y-%b-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%b-%d"];

/// Result of normalizing one batch.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutput {
    pub records: Vec<CanonicalRecord>,
    /// Records dropped for lack of a designation.
    pub rejected: Vec<SchemaError>,
    /// Malformed (not merely missing) values set to null, per field.
    pub parse_errors: FieldCounts,
}

/// Normalize a batch, discarding unidentifiable records.
pub fn normalize(raw: &[RawRecord]) -> Vec<CanonicalRecord> {
    normalize_with_report(raw).records
}

pub fn normalize_with_report(raw: &[RawRecord]) -> NormalizeOutput {
    let mut out = NormalizeOutput {
        records: Vec::with_capacity(raw.len()),
        ..Default::default()
    };
    for (index, record) in raw.iter().enumerate() {
        match normalize_record(index, record) {
            Ok((canonical, errors)) => {
                for e in &errors {
                    tracing::debug!(designation = %canonical.designation, error = %e, "field set to null");
                    out.parse_errors.bump(e.field());
                }
                out.records.push(canonical);
            }
            Err(e) => {
                tracing::debug!(error = %e, "record dropped");
                out.rejected.push(e);
            }
        }
    }
    out
}

/// Lower-case and trim every key, keep recognised fields only.
/// On collisions the first present value in key order wins; null and
/// whitespace-only text count as absent.
fn canonical_fields(raw: &RawRecord) -> BTreeMap<Field, &RawValue> {
    let mut fields = BTreeMap::new();
    for (key, value) in raw {
        let Some(field) = Field::from_raw_key(&key.trim().to_lowercase()) else {
            continue;
        };
        let slot = fields.entry(field).or_insert(value);
        if is_blank(slot) {
            *slot = value;
        }
    }
    fields
}

fn is_blank(value: &RawValue) -> bool {
    match value {
        RawValue::Null => true,
        RawValue::Text(s) => s.trim().is_empty(),
        RawValue::Number(_) => false,
    }
}

fn normalize_record(
    index: usize,
    raw: &RawRecord,
) -> Result<(CanonicalRecord, Vec<ParseError>), SchemaError> {
    let fields = canonical_fields(raw);
    let designation = fields
        .get(&Field::Designation)
        .and_then(|v| text_value(v))
        .filter(|s| !s.is_empty())
        .ok_or(SchemaError::MissingDesignation { index })?;

    let mut errors = Vec::new();
    let mut record = CanonicalRecord::new(designation);
    record.full_name = fields
        .get(&Field::FullName)
        .and_then(|v| text_value(v))
        .unwrap_or_default();

    record.close_approach_time = match fields.get(&Field::CloseApproachTime) {
        Some(v) => absorb(coerce_time(v), &mut errors),
        None => None,
    };

    let mut number = |field: Field| match fields.get(&field) {
        Some(v) => absorb(coerce_number(field, v), &mut errors),
        None => None,
    };
    record.miss_distance_au = number(Field::MissDistanceAu);
    record.relative_velocity_km_s = number(Field::RelativeVelocityKmS);
    record.estimated_diameter_km = number(Field::EstimatedDiameterKm);
    record.absolute_magnitude_h = number(Field::AbsoluteMagnitudeH);

    Ok((record, errors))
}

fn absorb<T>(result: Result<Option<T>, ParseError>, errors: &mut Vec<ParseError>) -> Option<T> {
    result.unwrap_or_else(|e| {
        errors.push(e);
        None
    })
}

fn text_value(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Text(s) => Some(s.trim().to_string()),
        RawValue::Number(n) => Some(n.to_string()),
        RawValue::Null => None,
    }
}

/// Permissive numeric coercion. Missing or blank is `Ok(None)`; garbage is an error.
fn coerce_number(field: Field, value: &RawValue) -> Result<Option<f64>, ParseError> {
    let n = match value {
        RawValue::Null => return Ok(None),
        RawValue::Number(n) => *n,
        RawValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>().map_err(|_| ParseError::NotNumeric {
                field,
                value: s.to_string(),
            })?
        }
    };
    if !n.is_finite() {
        return Err(ParseError::NotNumeric {
            field,
            value: n.to_string(),
        });
    }
    if field.non_negative() && n < 0.0 {
        return Err(ParseError::OutOfRange { field, value: n });
    }
    Ok(Some(n))
}

fn coerce_time(value: &RawValue) -> Result<Option<DateTime<Utc>>, ParseError> {
    let field = Field::CloseApproachTime;
    match value {
        RawValue::Null => Ok(None),
        RawValue::Number(n) => Err(ParseError::BadDate {
            field,
            value: n.to_string(),
        }),
        RawValue::Text(s) if s.trim().is_empty() => Ok(None),
        RawValue::Text(s) => parse_approach_time(s)
            .map(Some)
            .ok_or_else(|| ParseError::BadDate {
                field,
                value: s.trim().to_string(),
            }),
    }
}

/// Parse a close-approach timestamp as UTC.
///
/// Accepts the catalog's `2025-Jun-01 12:34` form, ISO dates with or without
/// a time part, and RFC 3339. Date-only input means midnight UTC.
pub fn parse_approach_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::raw_record;
    use chrono::TimeZone;

    #[test]
    fn keys_are_case_and_whitespace_insensitive() {
        let raw = raw_record([(" DES ", "2025 AB"), ("Dist", "0.02"), ("V_REL", "12.5")]);
        let out = normalize(&[raw]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].designation, "2025 AB");
        assert_eq!(out[0].miss_distance_au, Some(0.02));
        assert_eq!(out[0].relative_velocity_km_s, Some(12.5));
    }

    #[test]
    fn unknown_fields_dropped() {
        let raw = raw_record([("des", "X"), ("orbit_id", "12"), ("v_inf", "3.1")]);
        let out = normalize(&[raw]);
        assert_eq!(out[0], CanonicalRecord::new("X"));
    }

    #[test]
    fn malformed_date_keeps_record() {
        let raw = raw_record([("des", "X"), ("cd", "not a date"), ("dist", "0.3")]);
        let report = normalize_with_report(&[raw]);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].close_approach_time, None);
        assert_eq!(report.records[0].miss_distance_au, Some(0.3));
        assert_eq!(report.parse_errors.close_approach_time, 1);
    }

    #[test]
    fn numeric_coercion_is_permissive() {
        let mut raw = raw_record([("des", "X"), ("dist", "abc"), ("v_rel", " "), ("h", "-1.5")]);
        raw.insert("diameter".into(), RawValue::Number(-0.2));
        let report = normalize_with_report(&[raw]);
        let r = &report.records[0];
        assert_eq!(r.miss_distance_au, None);
        assert_eq!(r.relative_velocity_km_s, None);
        assert_eq!(r.estimated_diameter_km, None);
        assert_eq!(r.absolute_magnitude_h, Some(-1.5));
        assert_eq!(report.parse_errors.miss_distance_au, 1);
        assert_eq!(report.parse_errors.estimated_diameter_km, 1);
        assert_eq!(report.parse_errors.relative_velocity_km_s, 0);
    }

    #[test]
    fn nan_text_is_not_a_number() {
        let raw = raw_record([("des", "X"), ("dist", "NaN")]);
        let report = normalize_with_report(&[raw]);
        assert_eq!(report.records[0].miss_distance_au, None);
        assert_eq!(report.parse_errors.miss_distance_au, 1);
    }

    #[test]
    fn missing_designation_is_rejected() {
        let good = raw_record([("des", "A")]);
        let blank = raw_record([("des", "   "), ("dist", "0.1")]);
        let absent = raw_record([("fullname", "nobody")]);
        let report = normalize_with_report(&[good, blank, absent]);
        assert_eq!(report.records.len(), 1);
        assert_eq!(
            report.rejected,
            vec![
                SchemaError::MissingDesignation { index: 1 },
                SchemaError::MissingDesignation { index: 2 },
            ]
        );
    }

    #[test]
    fn order_is_preserved() {
        let raws: Vec<_> = ["c", "a", "b"]
            .into_iter()
            .map(|d| raw_record([("des", d)]))
            .collect();
        let names: Vec<_> = normalize(&raws).into_iter().map(|r| r.designation).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn colliding_keys_prefer_non_null() {
        let mut raw = raw_record([("des", "X")]);
        raw.insert("DIST".into(), RawValue::Null);
        raw.insert("dist".into(), RawValue::from("0.04"));
        let out = normalize(&[raw]);
        assert_eq!(out[0].miss_distance_au, Some(0.04));
    }

    #[test]
    fn blank_colliding_key_does_not_hide_value() {
        let mut raw = raw_record([(" Des ", RawValue::from("  ")), ("des", RawValue::from(433.0))]);
        raw.insert(" DIST ".into(), RawValue::from(" "));
        raw.insert("dist".into(), RawValue::from("0.005"));
        let report = normalize_with_report(&[raw]);
        assert!(report.rejected.is_empty());
        assert_eq!(report.records[0].designation, "433");
        assert_eq!(report.records[0].miss_distance_au, Some(0.005));
    }

    #[test]
    fn full_name_is_trimmed() {
        let raw = raw_record([("des", "433"), ("fullname", "   433 Eros (A898 PA)")]);
        assert_eq!(normalize(&[raw])[0].full_name, "433 Eros (A898 PA)");
    }

    #[test]
    fn parses_catalog_and_iso_dates() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 12, 34, 0).unwrap();
        assert_eq!(parse_approach_time("2025-Jun-01 12:34"), Some(expected));
        assert_eq!(parse_approach_time("2025-06-01 12:34"), Some(expected));
        assert_eq!(parse_approach_time("2025-06-01T12:34:00Z"), Some(expected));
        assert_eq!(
            parse_approach_time("2025-06-01"),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_approach_time("June first"), None);
    }
}
