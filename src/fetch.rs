//! Close-approach catalog client (JPL SBDB `cad.api`).
//!
//! Any failure is reported as "no new data"; a response that does not parse
//! cleanly is never turned into a partial batch.

use crate::config::FetchConfig;
use crate::schema::{RawRecord, RawValue};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("response has rows but no field list")]
    MissingFields,

    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug)]
pub enum FetchOutcome {
    Records(Vec<RawRecord>),
    NoNewData { reason: String },
}

impl FetchOutcome {
    fn from_result(result: Result<Vec<RawRecord>, FetchError>) -> Self {
        match result {
            Ok(records) if records.is_empty() => FetchOutcome::NoNewData {
                reason: "catalog returned no records".to_string(),
            },
            Ok(records) => FetchOutcome::Records(records),
            Err(e) => {
                warn!(error = %e, "fetch failed");
                FetchOutcome::NoNewData {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Tabular payload: column names plus rows of scalars.
#[derive(Deserialize)]
struct CadResponse {
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<RawValue>>,
}

/// Convert a `cad.api` body into raw records, one per row.
pub fn parse_response(body: &str) -> Result<Vec<RawRecord>, FetchError> {
    let resp: CadResponse = serde_json::from_str(body)?;
    if resp.data.is_empty() {
        return Ok(Vec::new());
    }
    if resp.fields.is_empty() {
        return Err(FetchError::MissingFields);
    }
    resp.data
        .into_iter()
        .enumerate()
        .map(|(row, values)| {
            if values.len() != resp.fields.len() {
                return Err(FetchError::RowWidth {
                    row,
                    expected: resp.fields.len(),
                    found: values.len(),
                });
            }
            Ok(resp.fields.iter().cloned().zip(values).collect())
        })
        .collect()
}

/// Read a saved response instead of calling the API.
pub fn replay(path: &Path) -> FetchOutcome {
    let result = std::fs::read_to_string(path)
        .map_err(FetchError::from)
        .and_then(|body| parse_response(&body));
    FetchOutcome::from_result(result)
}

pub struct CatalogClient {
    config: FetchConfig,
    client: reqwest::blocking::Client,
}

impl CatalogClient {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = vec![
            ("body", "Earth".to_string()),
            ("neo", "true".to_string()),
            ("diameter", "true".to_string()),
            ("fullname", "true".to_string()),
            ("sort", "date".to_string()),
            ("date-min", self.config.date_min.clone()),
            ("date-max", self.config.date_max.clone()),
        ];
        if let Some(d) = &self.config.dist_max {
            q.push(("dist-max", d.clone()));
        }
        if let Some(n) = self.config.limit {
            q.push(("limit", n.to_string()));
        }
        q
    }

    /// Raw response body.
    pub fn fetch_body(&self) -> Result<String, FetchError> {
        let res = self
            .client
            .get(&self.config.endpoint)
            .query(&self.query())
            .send()?
            .error_for_status()?;
        Ok(res.text()?)
    }

    /// Fetch and parse; optionally keep the body at `capture` for replay.
    pub fn fetch(&self, capture: Option<&Path>) -> FetchOutcome {
        let result = self.fetch_body().and_then(|body| {
            let records = parse_response(&body)?;
            if let Some(path) = capture {
                if let Err(e) = std::fs::write(path, &body) {
                    warn!(path = %path.display(), error = %e, "could not save raw capture");
                }
            }
            info!(count = records.len(), "catalog fetched");
            Ok(records)
        });
        FetchOutcome::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "signature": {"source": "NASA/JPL SBDB Close Approach Data API", "version": "1.5"},
        "count": "2",
        "fields": ["des", "orbit_id", "jd", "cd", "dist", "dist_min", "dist_max", "v_rel", "v_inf", "t_sigma_f", "h", "diameter", "diameter_sigma", "fullname"],
        "data": [
            ["2025 AB", "3", "2460827.5", "2025-Jun-01 00:00", "0.005", "0.004", "0.006", "10", "9.9", "< 00:01", "20", "0.2", null, "       (2025 AB)"],
            ["433", "659", "2460900.5", "2025-Aug-13 12:00", "0.3", "0.3", "0.3", "5.1", "5.0", "< 00:01", "10.4", "16.84", "0.06", "   433 Eros (A898 PA)"]
        ]
    }"#;

    #[test]
    fn rows_become_records() {
        let records = parse_response(BODY).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["des"], RawValue::from("2025 AB"));
        assert_eq!(records[0]["diameter_sigma"], RawValue::Null);
        assert_eq!(records[1]["dist"], RawValue::from("0.3"));
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let body = r#"{"signature": {"version": "1.5"}, "count": "0"}"#;
        assert!(parse_response(body).unwrap().is_empty());
        assert!(matches!(
            FetchOutcome::from_result(parse_response(body)),
            FetchOutcome::NoNewData { .. }
        ));
    }

    #[test]
    fn ragged_rows_reject_the_response() {
        let body = r#"{"fields": ["des", "cd"], "data": [["A", "2025-01-01"], ["B"]]}"#;
        assert!(matches!(
            parse_response(body),
            Err(FetchError::RowWidth { row: 1, expected: 2, found: 1 })
        ));
    }

    #[test]
    fn rows_without_fields_are_rejected() {
        let body = r#"{"data": [["A"]]}"#;
        assert!(matches!(parse_response(body), Err(FetchError::MissingFields)));
    }

    #[test]
    fn replay_reads_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw_data.json");
        std::fs::write(&path, BODY).unwrap();
        match replay(&path) {
            FetchOutcome::Records(r) => assert_eq!(r.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unreadable_capture_is_no_new_data() {
        let outcome = replay(Path::new("does/not/exist.json"));
        assert!(matches!(outcome, FetchOutcome::NoNewData { .. }));
    }
}
