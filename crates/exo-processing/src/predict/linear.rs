//! Multinomial logistic model loaded from a JSON artifact.

use super::{Classifier, Prediction, PredictionLabel, ProbabilityDistribution};
use crate::disposition;
use crate::error::ModelError;
use crate::types::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Serialized model: a standard scaler followed by a softmax regression.
///
/// Class labels are written in catalog vocabulary (`CONFIRMED`,
/// `CANDIDATE`, `FALSE POSITIVE`, or any spelling the disposition
/// normalizer understands).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    #[serde(default)]
    pub name: Option<String>,
    /// Feature names in input order.
    pub features: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    pub classes: Vec<String>,
    /// One row of weights per class.
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

/// Classifier backed by a [`LinearModelArtifact`].
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    name: String,
    artifact: LinearModelArtifact,
    labels: Vec<PredictionLabel>,
}

impl LinearClassifier {
    /// Validate an artifact and resolve its class labels.
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self, ModelError> {
        let n_features = artifact.features.len();
        let n_classes = artifact.classes.len();

        if n_features == 0 || n_classes == 0 {
            return Err(ModelError::InvalidArtifact(
                "model needs at least one feature and one class".to_string(),
            ));
        }
        if artifact.mean.len() != n_features || artifact.scale.len() != n_features {
            return Err(ModelError::InvalidArtifact(format!(
                "scaler has {} means and {} scales for {} features",
                artifact.mean.len(),
                artifact.scale.len(),
                n_features
            )));
        }
        if let Some(i) = artifact.scale.iter().position(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ModelError::InvalidArtifact(format!(
                "scale for '{}' must be finite and non-zero",
                artifact.features[i]
            )));
        }
        if artifact.intercepts.len() != n_classes
            || artifact.coefficients.len() != n_classes
            || artifact.coefficients.iter().any(|row| row.len() != n_features)
        {
            return Err(ModelError::InvalidArtifact(format!(
                "coefficients must be {} x {} with {} intercepts",
                n_classes, n_features, n_classes
            )));
        }

        let labels = artifact
            .classes
            .iter()
            .map(|class| {
                disposition::normalize(class)
                    .prediction_label()
                    .ok_or_else(|| ModelError::UnknownLabel(class.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = artifact
            .name
            .clone()
            .unwrap_or_else(|| "linear".to_string());

        Ok(Self {
            name,
            artifact,
            labels,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        Self::from_artifact(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn artifact(&self) -> &LinearModelArtifact {
        &self.artifact
    }

    fn standardized_input(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        self.artifact
            .features
            .iter()
            .zip(self.artifact.mean.iter().zip(&self.artifact.scale))
            .map(|(name, (mean, scale))| {
                features
                    .model_feature(name)
                    .map(|x| (x - mean) / scale)
                    .ok_or_else(|| ModelError::MissingFeature(name.clone()))
            })
            .collect()
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl Classifier for LinearClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        let x = self.standardized_input(features)?;

        let logits: Vec<f64> = self
            .artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(weights, intercept)| {
                intercept + weights.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>()
            })
            .collect();
        let probabilities = softmax(&logits);

        let mut distribution = ProbabilityDistribution::default();
        for (label, p) in self.labels.iter().zip(&probabilities) {
            distribution.add(*label, *p);
        }

        // Best class, not best label: classes sharing a label are not pooled.
        let (best, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, p)| if p > acc.1 { (i, p) } else { acc });

        if !confidence.is_finite() {
            return Err(ModelError::InvalidArtifact(
                "model produced non-finite probabilities".to_string(),
            ));
        }

        Ok(Prediction {
            label: self.labels[best],
            confidence,
            probability_distribution: distribution,
        })
    }
}
