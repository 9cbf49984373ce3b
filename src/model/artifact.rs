//! Persisted model artifact: fitted scaler plus model parameters, as JSON.
//!
//! ```json
//! {
//!   "feature_order": ["relative_velocity_km_s", "absolute_magnitude_h",
//!                     "estimated_diameter_km", "days_until_approach"],
//!   "feature_order_version": 1,
//!   "scaler": { "min": [0.5, 14.0, 0.0], "max": [40.0, 32.0, 5.0] },
//!   "model": { "kind": "logistic", "weights": [1.2, -0.4, 3.1, -0.01],
//!              "bias": -2.0, "threshold": 0.5 }
//! }
//! ```

use super::{LogisticModel, ModelClassifier};
use crate::error::ScalerFitError;
use crate::features::{FeatureVector, ScalerState, FEATURE_ORDER_VERSION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feature order {found:?} does not match {expected:?}")]
    FeatureOrderMismatch {
        found: Vec<String>,
        expected: [&'static str; FeatureVector::DIM],
    },

    #[error("feature order version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("expected {expected} weights, found {found}")]
    WeightCount { expected: usize, found: usize },

    #[error("invalid scaler: {0}")]
    Scaler(#[from] ScalerFitError),

    #[error("{0} backend not compiled in")]
    BackendUnavailable(&'static str),

    #[error("model backend: {0}")]
    Backend(String),
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic {
        weights: Vec<f64>,
        bias: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    /// Relative paths resolve against the artifact's directory.
    Onnx {
        path: PathBuf,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub feature_order: Option<Vec<String>>,
    #[serde(default)]
    pub feature_order_version: Option<u32>,
    #[serde(default)]
    pub scaler: Option<ScalerState>,
    pub model: ModelSpec,
}

/// A ready classifier and the training-time scaler, if the artifact has one.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub classifier: ModelClassifier,
    pub scaler: Option<ScalerState>,
}

impl ModelArtifact {
    pub fn from_json(data: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let data = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Reject artifacts trained against a different feature layout.
    pub fn check_contract(&self) -> Result<(), ArtifactError> {
        if let Some(found) = self.feature_order_version {
            if found != FEATURE_ORDER_VERSION {
                return Err(ArtifactError::VersionMismatch {
                    found,
                    expected: FEATURE_ORDER_VERSION,
                });
            }
        }
        if let Some(order) = &self.feature_order {
            if !order.iter().map(String::as_str).eq(FeatureVector::ORDER) {
                return Err(ArtifactError::FeatureOrderMismatch {
                    found: order.clone(),
                    expected: FeatureVector::ORDER,
                });
            }
        }
        if let Some(scaler) = &self.scaler {
            scaler.validate()?;
        }
        Ok(())
    }

    /// Build the classifier. `base_dir` anchors relative ONNX paths.
    pub fn into_model(self, base_dir: &Path) -> Result<LoadedModel, ArtifactError> {
        self.check_contract()?;
        let classifier = match self.model {
            ModelSpec::Logistic {
                weights,
                bias,
                threshold,
            } => {
                let weights: [f64; FeatureVector::DIM] =
                    weights
                        .as_slice()
                        .try_into()
                        .map_err(|_| ArtifactError::WeightCount {
                            expected: FeatureVector::DIM,
                            found: weights.len(),
                        })?;
                ModelClassifier::new(LogisticModel::new(weights, bias, threshold))
            }
            ModelSpec::Onnx { path, threshold } => {
                onnx_classifier(&base_dir.join(path), threshold)?
            }
        };
        Ok(LoadedModel {
            classifier,
            scaler: self.scaler,
        })
    }
}

/// Load an artifact file and build its classifier.
pub fn load_model(path: &Path) -> Result<LoadedModel, ArtifactError> {
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    ModelArtifact::load(path)?.into_model(base_dir)
}

#[cfg(feature = "onnx")]
fn onnx_classifier(path: &Path, threshold: f64) -> Result<ModelClassifier, ArtifactError> {
    Ok(ModelClassifier::new(super::OnnxModel::load(path, threshold)?))
}

#[cfg(not(feature = "onnx"))]
fn onnx_classifier(_path: &Path, _threshold: f64) -> Result<ModelClassifier, ArtifactError> {
    Err(ArtifactError::BackendUnavailable("onnx"))
}
