//! Pipeline driver: normalize → dedup → derive → classify.

use super::{table_version, ClassifiedDataset, DatasetMetadata};
use crate::config::{ClassifierChoice, ConfigError, PipelineConfig, ScalerChoice};
use crate::error::BatchError;
use crate::features::{FeatureDeriver, ScalerMode, ScalerStatus};
use crate::model::{classify, load_model, Classifier, LoadedModel, RuleClassifier};
use crate::schema::{normalize_with_report, CanonicalRecord, FieldCounts, RawRecord};
use chrono::{DateTime, NaiveTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

/// Holds the classifier and scaler choice for a run. Both are read-only
/// during `assemble`, so one assembler can serve concurrent batches.
pub struct Assembler {
    deriver: FeatureDeriver,
    classifier: Classifier,
}

impl Assembler {
    pub fn new(classifier: Classifier, scaler: ScalerMode) -> Self {
        Self {
            deriver: FeatureDeriver::new(scaler),
            classifier,
        }
    }

    /// Pick the classifier and scaler once, from configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let variant = config.classifier.variant;
        let wants_artifact =
            variant != ClassifierChoice::Rule || config.features.scaler == ScalerChoice::Pretrained;

        let loaded: Option<LoadedModel> = match (&config.model_path, wants_artifact) {
            (Some(path), true) => match load_model(path) {
                Ok(m) => {
                    info!(path = %path.display(), model = m.classifier.name(), "model artifact loaded");
                    Some(m)
                }
                Err(e) if variant == ClassifierChoice::Auto
                    && config.features.scaler != ScalerChoice::Pretrained =>
                {
                    warn!(path = %path.display(), error = %e, "model artifact unusable; using rule classifier");
                    None
                }
                Err(e) => return Err(e.into()),
            },
            (None, _) if variant == ClassifierChoice::Model => {
                return Err(ConfigError::ModelPathMissing)
            }
            _ => None,
        };

        let artifact_scaler = loaded.as_ref().and_then(|m| m.scaler);
        let classifier = match (variant, loaded) {
            (ClassifierChoice::Rule, _) | (_, None) => Classifier::Rule(RuleClassifier),
            (_, Some(m)) => Classifier::Model(m.classifier),
        };

        let scaler = match (config.features.scaler, artifact_scaler) {
            (ScalerChoice::FitPerBatch, _) => ScalerMode::FitPerBatch,
            (ScalerChoice::Pretrained | ScalerChoice::Auto, Some(state)) => {
                ScalerMode::Pretrained(state)
            }
            (ScalerChoice::Pretrained, None) => return Err(ConfigError::PretrainedScalerMissing),
            (ScalerChoice::Auto, None) => {
                if matches!(classifier, Classifier::Model(_)) {
                    warn!("model artifact has no fitted scaler; fitting per batch");
                }
                ScalerMode::FitPerBatch
            }
        };

        info!(classifier = ?classifier.variant(), pretrained_scaler = matches!(scaler, ScalerMode::Pretrained(_)), "pipeline configured");
        Ok(Self::new(classifier, scaler))
    }

    pub fn scaler(&self) -> &ScalerMode {
        self.deriver.mode()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Build the classified table for one raw batch.
    ///
    /// `now` is truncated to midnight UTC, so any time on the same day gives
    /// the same table.
    pub fn assemble(
        &self,
        raw: &[RawRecord],
        now: DateTime<Utc>,
    ) -> Result<ClassifiedDataset, BatchError> {
        if raw.is_empty() {
            return Err(BatchError::EmptyInput);
        }

        let normalized = normalize_with_report(raw);
        let dropped = normalized.rejected.len();
        if normalized.records.is_empty() {
            return Err(BatchError::AllRecordsDropped { dropped });
        }

        let (records, duplicates_removed) = dedup_last_wins(normalized.records);
        let defaulted = FieldCounts::nulls(&records);

        let reference_day = now.date_naive();
        let now = reference_day.and_time(NaiveTime::MIN).and_utc();

        let derived = self.deriver.derive(records, now);
        let scaler = match (&derived.scaler, self.deriver.mode()) {
            (Ok(_), ScalerMode::FitPerBatch) => ScalerStatus::Fitted,
            (Ok(_), ScalerMode::Pretrained(_)) => ScalerStatus::Pretrained,
            (Err(e), _) => ScalerStatus::Failed {
                reason: e.to_string(),
            },
        };

        let classified = classify(derived.records, &self.classifier);
        let version = table_version(&classified.records);

        let metadata = DatasetMetadata {
            source_count: raw.len(),
            output_count: classified.records.len(),
            dropped,
            duplicates_removed,
            defaulted,
            parse_errors: normalized.parse_errors,
            classifier: self.classifier.variant(),
            model_fallbacks: classified.model_fallbacks,
            scaler,
            reference_day,
            version,
        };
        info!(
            source = metadata.source_count,
            rows = metadata.output_count,
            dropped,
            duplicates_removed,
            model_fallbacks = metadata.model_fallbacks,
            degraded = metadata.is_degraded(),
            version = %metadata.version,
            "batch assembled"
        );

        Ok(ClassifiedDataset {
            records: classified.records,
            metadata,
        })
    }
}

/// One-shot assembly with a scaler fit on this batch.
///
/// Like [`Assembler::assemble`], `now` is truncated to midnight UTC first, so
/// an approach earlier on the same day counts as day 0. Call
/// [`FeatureDeriver::derive`] directly for differences from an exact instant.
pub fn assemble(
    raw: &[RawRecord],
    classifier: &Classifier,
    now: DateTime<Utc>,
) -> Result<ClassifiedDataset, BatchError> {
    Assembler::new(classifier.clone(), ScalerMode::FitPerBatch).assemble(raw, now)
}

/// Keep the last record per `(designation, close_approach_time)`, at the
/// position of that last occurrence.
fn dedup_last_wins(records: Vec<CanonicalRecord>) -> (Vec<CanonicalRecord>, usize) {
    let keep: Vec<bool> = {
        let mut last = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            last.insert(r.key(), i);
        }
        records
            .iter()
            .enumerate()
            .map(|(i, r)| last.get(&r.key()) == Some(&i))
            .collect()
    };
    let before = records.len();
    let kept: Vec<CanonicalRecord> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(r, k)| k.then_some(r))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
