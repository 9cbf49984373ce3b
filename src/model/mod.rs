//! Hazard classification: a trained model behind a fixed feature-vector
//! contract, or the deterministic distance/diameter rule.

mod artifact;
mod logistic;
#[cfg(feature = "onnx")]
mod onnx;
mod rule;

pub use artifact::{load_model, ArtifactError, LoadedModel, ModelArtifact, ModelSpec};
pub use logistic::LogisticModel;
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
pub use rule::RuleClassifier;

use crate::error::ClassifierError;
use crate::features::{FeatureRecord, FeatureVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Output of a predictive model for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub hazardous: bool,
    pub probability: Option<f64>,
}

/// A trained model. Implementations hold immutable fitted parameters and
/// may be shared across threads.
pub trait HazardModel: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ClassifierError>;
}

#[derive(Clone)]
pub struct ModelClassifier {
    model: Arc<dyn HazardModel>,
}

impl ModelClassifier {
    pub fn new(model: impl HazardModel + 'static) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    pub fn from_arc(model: Arc<dyn HazardModel>) -> Self {
        Self { model }
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ClassifierError> {
        self.model.predict(features)
    }
}

impl fmt::Debug for ModelClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClassifier")
            .field("model", &self.model.name())
            .finish()
    }
}

/// One variant is chosen per batch and applied to every record.
#[derive(Debug, Clone)]
pub enum Classifier {
    Model(ModelClassifier),
    Rule(RuleClassifier),
}

impl Classifier {
    pub fn variant(&self) -> ClassifierVariant {
        match self {
            Classifier::Model(m) => ClassifierVariant::Model {
                name: m.name().to_string(),
            },
            Classifier::Rule(_) => ClassifierVariant::Rule,
        }
    }
}

impl From<RuleClassifier> for Classifier {
    fn from(r: RuleClassifier) -> Self {
        Classifier::Rule(r)
    }
}

impl From<ModelClassifier> for Classifier {
    fn from(m: ModelClassifier) -> Self {
        Classifier::Model(m)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ClassifierVariant {
    Rule,
    Model { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub features: FeatureRecord,
    pub is_hazardous: bool,
    /// Raw model probability; absent under the rule classifier or fallback.
    pub hazard_score: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Classified {
    pub records: Vec<ClassifiedRecord>,
    /// Records where the model failed and the rule decided instead.
    pub model_fallbacks: usize,
}

/// Classify a batch. Model failures fall back to the rule per record; the
/// batch itself never fails.
pub fn classify(records: Vec<FeatureRecord>, classifier: &Classifier) -> Classified {
    let rule = RuleClassifier;
    let mut model_fallbacks = 0;
    let records = records
        .into_iter()
        .map(|features| {
            let (is_hazardous, hazard_score) = match classifier {
                Classifier::Rule(r) => (r.is_hazardous(&features.canonical), None),
                Classifier::Model(m) => {
                    match m.predict(&FeatureVector::from_record(&features)) {
                        Ok(p) => (p.hazardous, p.probability),
                        Err(e) => {
                            model_fallbacks += 1;
                            tracing::debug!(
                                designation = %features.canonical.designation,
                                model = m.name(),
                                error = %e,
                                "model failed; rule fallback"
                            );
                            (rule.is_hazardous(&features.canonical), None)
                        }
                    }
                }
            };
            ClassifiedRecord {
                features,
                is_hazardous,
                hazard_score,
            }
        })
        .collect();
    if model_fallbacks > 0 {
        tracing::warn!(model_fallbacks, "model inference failed for some records");
    }
    Classified {
        records,
        model_fallbacks,
    }
}
