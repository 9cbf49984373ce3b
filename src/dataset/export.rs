//! Flat file rendering of the classified table, and atomic snapshot writes.

use super::{ClassifiedDataset, ClassifiedRecord};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output column order.
pub const COLUMNS: [&str; 11] = [
    "designation",
    "full_name",
    "close_approach_time",
    "miss_distance_au",
    "relative_velocity_km_s",
    "estimated_diameter_km",
    "absolute_magnitude_h",
    "days_until_approach",
    "risk_category",
    "is_hazardous",
    "hazard_score",
];

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Ndjson,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// One output row, field order = [`COLUMNS`].
#[derive(Serialize)]
struct OutputRow<'a> {
    designation: &'a str,
    full_name: &'a str,
    close_approach_time: Option<String>,
    miss_distance_au: Option<f64>,
    relative_velocity_km_s: Option<f64>,
    estimated_diameter_km: Option<f64>,
    absolute_magnitude_h: Option<f64>,
    days_until_approach: Option<i64>,
    risk_category: &'static str,
    is_hazardous: bool,
    hazard_score: Option<f64>,
}

impl<'a> From<&'a ClassifiedRecord> for OutputRow<'a> {
    fn from(r: &'a ClassifiedRecord) -> Self {
        let c = &r.features.canonical;
        Self {
            designation: &c.designation,
            full_name: &c.full_name,
            close_approach_time: c
                .close_approach_time
                .map(|t| t.format(TIME_FORMAT).to_string()),
            miss_distance_au: c.miss_distance_au,
            relative_velocity_km_s: c.relative_velocity_km_s,
            estimated_diameter_km: c.estimated_diameter_km,
            absolute_magnitude_h: c.absolute_magnitude_h,
            days_until_approach: r.features.days_until_approach,
            risk_category: r.features.risk_category.as_str(),
            is_hazardous: r.is_hazardous,
            hazard_score: r.hazard_score,
        }
    }
}

impl OutputRow<'_> {
    fn cells(&self) -> [Cow<'_, str>; 11] {
        fn opt<T: ToString>(v: Option<T>) -> Cow<'static, str> {
            v.map_or(Cow::Borrowed(""), |v| Cow::Owned(v.to_string()))
        }
        [
            Cow::Borrowed(self.designation),
            Cow::Borrowed(self.full_name),
            self.close_approach_time
                .as_deref()
                .map_or(Cow::Borrowed(""), Cow::Borrowed),
            opt(self.miss_distance_au),
            opt(self.relative_velocity_km_s),
            opt(self.estimated_diameter_km),
            opt(self.absolute_magnitude_h),
            opt(self.days_until_approach),
            Cow::Borrowed(self.risk_category),
            Cow::Borrowed(if self.is_hazardous { "true" } else { "false" }),
            opt(self.hazard_score),
        ]
    }
}

/// RFC 4180 quoting: only when the cell needs it.
fn quote(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

fn write_line<'a, W: Write>(w: &mut W, cells: impl IntoIterator<Item = &'a str>) -> io::Result<()> {
    let line: Vec<Cow<'_, str>> = cells.into_iter().map(quote).collect();
    writeln!(w, "{}", line.join(","))
}

/// Header plus one line per record. Nulls are empty cells.
pub fn write_csv<W: Write>(records: &[ClassifiedRecord], w: &mut W) -> io::Result<()> {
    write_line(w, COLUMNS)?;
    for r in records {
        let row = OutputRow::from(r);
        let cells = row.cells();
        write_line(w, cells.iter().map(|c| c.as_ref()))?;
    }
    Ok(())
}

/// One JSON object per line.
pub fn write_ndjson<W: Write>(records: &[ClassifiedRecord], w: &mut W) -> Result<(), ExportError> {
    for r in records {
        serde_json::to_writer(&mut *w, &OutputRow::from(r))?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// CSV rendering in memory.
pub fn render_csv(records: &[ClassifiedRecord]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf).expect("write to Vec");
    buf
}

/// SHA-256 hex digest of the CSV rendering.
pub fn table_version(records: &[ClassifiedRecord]) -> String {
    format!("{:x}", Sha256::digest(render_csv(records)))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Write via a temporary sibling and rename, so readers never see a partial file.
fn replace_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<(), ExportError>,
) -> Result<(), ExportError> {
    let tmp = sibling(path, ".tmp");
    let mut w = BufWriter::new(File::create(&tmp)?);
    let written = write(&mut w).and_then(|_| Ok(w.flush()?));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    drop(w);
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Persist the table (and optionally `<path>.meta.json`). Replaces any
/// previous snapshot atomically.
pub fn write_snapshot(
    path: &Path,
    dataset: &ClassifiedDataset,
    format: OutputFormat,
    sidecar: bool,
) -> Result<(), ExportError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    replace_file(path, |w| match format {
        OutputFormat::Csv => Ok(write_csv(&dataset.records, w)?),
        OutputFormat::Ndjson => write_ndjson(&dataset.records, w),
    })?;
    if sidecar {
        replace_file(&sibling(path, ".meta.json"), |w| {
            serde_json::to_writer_pretty(&mut *w, &dataset.metadata)?;
            Ok(w.write_all(b"\n")?)
        })?;
    }
    tracing::info!(path = %path.display(), rows = dataset.len(), format = ?format, "snapshot written");
    Ok(())
}
