//! Per-mission model lookup with a rule-based fallback.

use super::{Classifier, RuleBasedClassifier};
use crate::error::ModelError;
use crate::predict::LinearClassifier;
use crate::types::{FeatureVector, PredictionOutcome, SchemaKind};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Immutable set of classifiers keyed by mission.
///
/// Built once and shared through an `Arc`. Missions without a model, and
/// models that fail on a vector, are answered by the fallback classifier.
///
/// # Example
///
/// ```rust,ignore
/// use exo_processing::predict::{ModelRegistry, LinearClassifier};
/// use exo_processing::SchemaKind;
/// use std::sync::Arc;
///
/// let registry = ModelRegistry::builder()
///     .register(SchemaKind::Kepler, Arc::new(LinearClassifier::from_path("kepler.json")?))
///     .build();
/// ```
pub struct ModelRegistry {
    models: HashMap<SchemaKind, Arc<dyn Classifier>>,
    fallback: Arc<dyn Classifier>,
}

static_assertions::assert_impl_all!(ModelRegistry: Send, Sync);

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Registry with no trained models; every prediction uses the fallback.
    pub fn rule_based() -> Self {
        Self::builder().build()
    }

    /// Load `kepler.json`, `k2.json` and `tess.json` from `dir`.
    ///
    /// Absent files are skipped. Files that fail to load are skipped with a
    /// warning so that a single broken artifact does not disable the others.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Io`] when `dir` cannot be read.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let dir = dir.as_ref();
        // A missing directory is an error, not an empty registry.
        std::fs::read_dir(dir)?;

        let mut builder = Self::builder();
        for schema in SchemaKind::KNOWN {
            let path = dir.join(format!("{}.json", schema.as_str()));
            if !path.is_file() {
                debug!("No model artifact at {}", path.display());
                continue;
            }
            match LinearClassifier::from_path(&path) {
                Ok(model) => {
                    info!("Loaded {} model '{}' from {}", schema, model.name(), path.display());
                    builder = builder.register(schema, Arc::new(model));
                }
                Err(e) => warn!("Skipping model artifact {}: {}", path.display(), e),
            }
        }
        Ok(builder.build())
    }

    pub fn get(&self, schema: SchemaKind) -> Option<&Arc<dyn Classifier>> {
        self.models.get(&schema)
    }

    pub fn has_model(&self, schema: SchemaKind) -> bool {
        self.models.contains_key(&schema)
    }

    pub fn fallback(&self) -> &Arc<dyn Classifier> {
        &self.fallback
    }

    /// Missions with a registered model, in a stable order.
    pub fn schemas(&self) -> Vec<SchemaKind> {
        let mut schemas: Vec<SchemaKind> = self.models.keys().copied().collect();
        schemas.sort();
        schemas
    }

    /// Classify `features` with the model for its schema, falling back to
    /// the stand-in when there is none or it fails.
    ///
    /// # Errors
    ///
    /// Only when the fallback classifier itself fails.
    pub fn predict_with_fallback(
        &self,
        features: &FeatureVector,
    ) -> Result<PredictionOutcome, ModelError> {
        if let Some(model) = self.get(features.schema) {
            match model.predict(features) {
                Ok(prediction) => {
                    return Ok(PredictionOutcome {
                        interpretation: prediction.interpretation(),
                        model: model.name().to_string(),
                        used_fallback: false,
                        prediction,
                    });
                }
                Err(e) => warn!(
                    "Model '{}' failed for {} features: {}; using {}",
                    model.name(),
                    features.schema,
                    e,
                    self.fallback.name()
                ),
            }
        } else {
            debug!("No model registered for {}; using {}", features.schema, self.fallback.name());
        }

        let prediction = self.fallback.predict(features)?;
        Ok(PredictionOutcome {
            interpretation: prediction.interpretation(),
            model: self.fallback.name().to_string(),
            used_fallback: true,
            prediction,
        })
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::rule_based()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let models: Vec<(SchemaKind, &str)> = self
            .schemas()
            .into_iter()
            .filter_map(|s| self.get(s).map(|m| (s, m.name())))
            .collect();
        f.debug_struct("ModelRegistry")
            .field("models", &models)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

/// Builder for a [`ModelRegistry`].
#[derive(Default)]
pub struct ModelRegistryBuilder {
    models: HashMap<SchemaKind, Arc<dyn Classifier>>,
    fallback: Option<Arc<dyn Classifier>>,
}

impl ModelRegistryBuilder {
    /// Register the model for a mission, replacing any earlier one.
    pub fn register(mut self, schema: SchemaKind, model: Arc<dyn Classifier>) -> Self {
        self.models.insert(schema, model);
        self
    }

    /// Replace the rule-based fallback.
    pub fn fallback(mut self, model: Arc<dyn Classifier>) -> Self {
        self.fallback = Some(model);
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            models: self.models,
            fallback: self
                .fallback
                .unwrap_or_else(|| Arc::new(RuleBasedClassifier::new())),
        }
    }
}
