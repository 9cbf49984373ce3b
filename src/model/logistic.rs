//! Logistic regression over the four-feature vector.

use super::{HazardModel, Prediction};
use crate::error::ClassifierError;
use crate::features::FeatureVector;

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    weights: [f64; FeatureVector::DIM],
    bias: f64,
    threshold: f64,
}

impl LogisticModel {
    pub fn new(weights: [f64; FeatureVector::DIM], bias: f64, threshold: f64) -> Self {
        Self {
            weights,
            bias,
            threshold,
        }
    }

    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let z = self
            .weights
            .iter()
            .zip(features.to_array())
            .fold(self.bias, |acc, (w, x)| acc + w * x);
        1.0 / (1.0 + (-z).exp())
    }
}

impl HazardModel for LogisticModel {
    fn name(&self) -> &str {
        "logistic"
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ClassifierError> {
        let p = self.probability(features);
        if !p.is_finite() {
            return Err(ClassifierError::NonFinite);
        }
        Ok(Prediction {
            hazardous: p >= self.threshold,
            probability: Some(p),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(days: f64) -> FeatureVector {
        FeatureVector {
            relative_velocity_km_s: 0.0,
            absolute_magnitude_h: 0.0,
            estimated_diameter_km: 0.0,
            days_until_approach: days,
        }
    }

    #[test]
    fn zero_logit_is_half() {
        let m = LogisticModel::new([0.0; 4], 0.0, 0.5);
        let p = m.predict(&fv(10.0)).unwrap();
        assert_eq!(p.probability, Some(0.5));
        assert!(p.hazardous);
    }

    #[test]
    fn weights_follow_vector_order() {
        let m = LogisticModel::new([0.0, 0.0, 0.0, -1.0], 0.0, 0.5);
        assert!(m.probability(&fv(5.0)) < 0.01);
        assert!(!m.predict(&fv(5.0)).unwrap().hazardous);
    }

    #[test]
    fn nan_input_is_an_error() {
        let m = LogisticModel::new([1.0; 4], 0.0, 0.5);
        assert_eq!(m.predict(&fv(f64::NAN)), Err(ClassifierError::NonFinite));
    }
}
