//! The consolidated output table and its metadata.

mod assembler;
mod export;

pub use assembler::{assemble, Assembler};
pub use export::{
    render_csv, table_version, write_csv, write_ndjson, write_snapshot, ExportError, OutputFormat,
    COLUMNS,
};

pub use crate::model::ClassifiedRecord;

use crate::features::ScalerStatus;
use crate::model::ClassifierVariant;
use crate::risk::RiskCategory;
use crate::schema::FieldCounts;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Raw records received.
    pub source_count: usize,
    /// Rows in the table.
    pub output_count: usize,
    /// Records discarded for lack of a designation.
    pub dropped: usize,
    /// Earlier occurrences overwritten by a later record with the same key.
    pub duplicates_removed: usize,
    /// Null (missing or malformed) values per field in the output rows.
    pub defaulted: FieldCounts,
    /// Malformed values seen in the batch, per field.
    pub parse_errors: FieldCounts,
    pub classifier: ClassifierVariant,
    pub model_fallbacks: usize,
    pub scaler: ScalerStatus,
    /// UTC day the relative features were computed against.
    pub reference_day: NaiveDate,
    /// SHA-256 of the CSV rendering of the table.
    pub version: String,
}

impl DatasetMetadata {
    /// Scaling failed or the model had to be bypassed for some rows.
    pub fn is_degraded(&self) -> bool {
        self.scaler.is_degraded() || self.model_fallbacks > 0
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedDataset {
    pub records: Vec<ClassifiedRecord>,
    pub metadata: DatasetMetadata,
}

/// Headline figures over the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total: usize,
    pub hazardous: usize,
    pub hazardous_pct: f64,
    pub close: usize,
    pub medium: usize,
    pub far: usize,
}

impl ClassifiedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn hazardous(&self) -> impl Iterator<Item = &ClassifiedRecord> {
        self.records.iter().filter(|r| r.is_hazardous)
    }

    pub fn summary(&self) -> DatasetSummary {
        let total = self.records.len();
        let hazardous = self.hazardous().count();
        let count = |c: RiskCategory| {
            self.records
                .iter()
                .filter(|r| r.features.risk_category == c)
                .count()
        };
        DatasetSummary {
            total,
            hazardous,
            hazardous_pct: if total > 0 {
                hazardous as f64 * 100.0 / total as f64
            } else {
                0.0
            },
            close: count(RiskCategory::Close),
            medium: count(RiskCategory::Medium),
            far: count(RiskCategory::Far),
        }
    }

    pub fn to_csv_string(&self) -> String {
        String::from_utf8_lossy(&render_csv(&self.records)).into_owned()
    }
}
