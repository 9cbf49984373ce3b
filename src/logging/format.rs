//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use crate::dataset::ClassifiedDataset;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Per-batch line written to stdout after a snapshot.
#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub ts: String,
    pub version: &'a str,
    pub rows: usize,
    pub hazardous: usize,
    pub hazardous_pct: f64,
    pub close: usize,
    pub medium: usize,
    pub far: usize,
    pub dropped: usize,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<&'a str>,
}

impl<'a> BatchReport<'a> {
    pub fn new(dataset: &'a ClassifiedDataset, snapshot: Option<&'a str>) -> Self {
        let s = dataset.summary();
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            version: &dataset.metadata.version,
            rows: s.total,
            hazardous: s.hazardous,
            hazardous_pct: s.hazardous_pct,
            close: s.close,
            medium: s.medium,
            far: s.far,
            dropped: dataset.metadata.dropped,
            degraded: dataset.metadata.is_degraded(),
            snapshot,
        }
    }
}

/// Initialize tracing (JSON or human format) on stderr; stdout carries reports.
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber, level from RUST_LOG or `default_level`.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single structured line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Line {
        rows: usize,
    }

    #[test]
    fn emits_one_line() {
        let mut buf = Vec::new();
        StructuredLogger::emit_json(&Line { rows: 3 }, &mut buf);
        StructuredLogger::emit_json(&Line { rows: 4 }, &mut buf);
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"rows\":3}\n{\"rows\":4}\n");
    }
}
