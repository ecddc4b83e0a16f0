//! Prediction collaborators.
//!
//! Reconciled feature vectors are handed to a [`Classifier`]. Trained
//! per-mission models are looked up in a [`ModelRegistry`]; when one is
//! missing or fails, the rule-based stand-in answers instead.

mod linear;
mod registry;
mod rule_based;

pub use linear::{LinearClassifier, LinearModelArtifact};
pub use registry::{ModelRegistry, ModelRegistryBuilder};
pub use rule_based::RuleBasedClassifier;

use crate::error::ModelError;
use crate::types::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence below which an interpretation asks for more data.
pub const LOW_CONFIDENCE: f64 = 0.6;

/// Confidence above which an interpretation calls the result strong.
pub const HIGH_CONFIDENCE: f64 = 0.9;

/// Outcome vocabulary of every classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionLabel {
    Exoplanet,
    Candidate,
    FalsePositive,
}

impl PredictionLabel {
    pub const ALL: [PredictionLabel; 3] = [Self::Exoplanet, Self::Candidate, Self::FalsePositive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exoplanet => "exoplanet",
            Self::Candidate => "candidate",
            Self::FalsePositive => "false_positive",
        }
    }

    fn explanation(&self) -> &'static str {
        match self {
            Self::Exoplanet => {
                "The signal is consistent with a real planetary transit; the orbital period and \
                 transit depth point to a planet."
            }
            Self::Candidate => {
                "The signal looks promising but needs follow-up observations before it can be \
                 confirmed."
            }
            Self::FalsePositive => {
                "The pattern is most likely stellar variability, an eclipsing binary or an \
                 instrumental artifact rather than a planet."
            }
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability assigned to each label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProbabilityDistribution {
    pub exoplanet: f64,
    pub candidate: f64,
    pub false_positive: f64,
}

impl ProbabilityDistribution {
    pub fn new(exoplanet: f64, candidate: f64, false_positive: f64) -> Self {
        Self {
            exoplanet,
            candidate,
            false_positive,
        }
    }

    pub fn get(&self, label: PredictionLabel) -> f64 {
        match label {
            PredictionLabel::Exoplanet => self.exoplanet,
            PredictionLabel::Candidate => self.candidate,
            PredictionLabel::FalsePositive => self.false_positive,
        }
    }

    pub(crate) fn add(&mut self, label: PredictionLabel, p: f64) {
        match label {
            PredictionLabel::Exoplanet => self.exoplanet += p,
            PredictionLabel::Candidate => self.candidate += p,
            PredictionLabel::FalsePositive => self.false_positive += p,
        }
    }

    /// Most probable label; ties go to the earlier label in [`PredictionLabel::ALL`].
    pub fn argmax(&self) -> PredictionLabel {
        PredictionLabel::ALL
            .into_iter()
            .fold(PredictionLabel::Exoplanet, |best, label| {
                if self.get(label) > self.get(best) { label } else { best }
            })
    }
}

/// A classifier's answer for one feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: PredictionLabel,
    pub confidence: f64,
    pub probability_distribution: ProbabilityDistribution,
}

impl Prediction {
    /// Human-readable explanation of the label, qualified by confidence.
    pub fn interpretation(&self) -> String {
        let mut text = self.label.explanation().to_string();
        if self.confidence < LOW_CONFIDENCE {
            text.push_str(" Low confidence: more data is needed for a definitive classification.");
        } else if self.confidence > HIGH_CONFIDENCE {
            text.push_str(" High confidence strongly supports this classification.");
        }
        text
    }
}

/// A model that classifies reconciled feature vectors.
///
/// Implementations must be `Send + Sync` so a registry can be shared
/// across threads.
pub trait Classifier: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Classify one feature vector.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingFeature`] when the vector lacks a
    /// feature the model needs.
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError>;
}
