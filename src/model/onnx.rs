//! ONNX Runtime backend. Input: [1, 4] f32 in feature-vector order.
//! Output: first tensor, read as a hazard probability (the second element is
//! taken when the model emits two class probabilities).

use super::{ArtifactError, HazardModel, Prediction};
use crate::error::ClassifierError;
use crate::features::FeatureVector;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

pub struct OnnxModel {
    session: Mutex<Session>,
    output_name: String,
    threshold: f64,
}

impl OnnxModel {
    pub fn load(path: &Path, threshold: f64) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        }
        let session = Session::builder()
            .map_err(|e| ArtifactError::Backend(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| ArtifactError::Backend(e.to_string()))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ArtifactError::Backend("model declares no outputs".to_string()))?;
        tracing::info!(path = %path.display(), output = %output_name, "ONNX model loaded");
        Ok(Self {
            session: Mutex::new(session),
            output_name,
            threshold,
        })
    }
}

impl HazardModel for OnnxModel {
    fn name(&self) -> &str {
        "onnx"
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ClassifierError> {
        let input = Array2::<f32>::from_shape_vec((1, FeatureVector::DIM), features.to_f32().to_vec())
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let tensor = Value::from_array(input).map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| ClassifierError::Inference("missing output".to_string()))?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let p = f64::from(match data {
            [_, positive, ..] => *positive,
            [single] => *single,
            [] => return Err(ClassifierError::Inference("empty output".to_string())),
        });
        if !p.is_finite() {
            return Err(ClassifierError::NonFinite);
        }
        Ok(Prediction {
            hazardous: p >= self.threshold,
            probability: Some(p),
        })
    }
}
