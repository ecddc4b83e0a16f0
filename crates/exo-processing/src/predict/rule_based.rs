//! Threshold classifier used when no trained model is available.

use super::{Classifier, Prediction, PredictionLabel, ProbabilityDistribution};
use crate::error::ModelError;
use crate::types::FeatureVector;

/// Transit depth (fraction) above which a short-period signal is called a planet.
pub const PLANET_DEPTH: f64 = 0.01;

/// Orbital period (days) below which a deep signal is called a planet.
pub const PLANET_MAX_PERIOD: f64 = 50.0;

/// Transit depth (fraction) above which a signal is called a candidate.
pub const CANDIDATE_DEPTH: f64 = 0.005;

/// Stand-in classifier driven by depth and period thresholds.
///
/// A vector without a transit depth is treated as having depth 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for RuleBasedClassifier {
    fn name(&self) -> &str {
        "rule_based"
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        let depth = features.transit_depth.unwrap_or(0.0);

        let (label, confidence, distribution) =
            if depth > PLANET_DEPTH && features.orbital_period < PLANET_MAX_PERIOD {
                (
                    PredictionLabel::Exoplanet,
                    0.85,
                    ProbabilityDistribution::new(0.85, 0.10, 0.05),
                )
            } else if depth > CANDIDATE_DEPTH {
                (
                    PredictionLabel::Candidate,
                    0.70,
                    ProbabilityDistribution::new(0.20, 0.70, 0.10),
                )
            } else {
                (
                    PredictionLabel::FalsePositive,
                    0.80,
                    ProbabilityDistribution::new(0.05, 0.15, 0.80),
                )
            };

        Ok(Prediction {
            label,
            confidence,
            probability_distribution: distribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SchemaKind;
    use std::collections::BTreeMap;

    fn vector(period: f64, depth: Option<f64>) -> FeatureVector {
        FeatureVector {
            schema: SchemaKind::Kepler,
            orbital_period: period,
            transit_duration: Some(3.0),
            transit_depth: depth,
            stellar_radius: 1.0,
            stellar_mass: 1.0,
            stellar_temperature: 5778.0,
            model_features: BTreeMap::new(),
        }
    }

    #[test]
    fn test_deep_short_period_is_exoplanet() {
        let p = RuleBasedClassifier.predict(&vector(10.0, Some(0.02))).unwrap();
        assert_eq!(p.label, PredictionLabel::Exoplanet);
        assert_eq!(p.confidence, 0.85);
    }

    #[test]
    fn test_deep_long_period_is_candidate() {
        let p = RuleBasedClassifier.predict(&vector(120.0, Some(0.02))).unwrap();
        assert_eq!(p.label, PredictionLabel::Candidate);
        assert_eq!(p.probability_distribution.candidate, 0.70);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let at_planet = RuleBasedClassifier.predict(&vector(10.0, Some(0.01))).unwrap();
        assert_eq!(at_planet.label, PredictionLabel::Candidate);

        let at_candidate = RuleBasedClassifier.predict(&vector(10.0, Some(0.005))).unwrap();
        assert_eq!(at_candidate.label, PredictionLabel::FalsePositive);
    }

    #[test]
    fn test_missing_depth_is_false_positive() {
        let p = RuleBasedClassifier.predict(&vector(10.0, None)).unwrap();
        assert_eq!(p.label, PredictionLabel::FalsePositive);
        assert_eq!(p.probability_distribution, ProbabilityDistribution::new(0.05, 0.15, 0.80));
    }
}
