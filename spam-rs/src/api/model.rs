//! Readiness-gated model handle
//!
//! A [`ModelHandle`] only exists once an artifact has been loaded, so a
//! server holding one is ready by construction. The pipeline inside is
//! immutable and shared read-only between requests.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

use crate::classifier::ModelKind;
use crate::error::{Result, SpamError};
use crate::pipeline::{Pipeline, Prediction};
use crate::text::TextNormalizer;
use crate::training::ModelArtifact;

/// Loaded pipeline plus the normalizer it was trained with
#[derive(Debug, Clone)]
pub struct ModelHandle {
    pipeline: Arc<Pipeline>,
    normalizer: TextNormalizer,
    trained_at: Option<DateTime<Utc>>,
}

impl ModelHandle {
    /// Load a persisted artifact; any failure leaves the caller without a handle
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        check_servable(&artifact.pipeline)?;
        Ok(Self {
            trained_at: Some(artifact.header.trained_at),
            pipeline: Arc::new(artifact.pipeline),
            normalizer: TextNormalizer::new(),
        })
    }

    /// Wrap an in-memory fitted pipeline
    pub fn from_pipeline(pipeline: Pipeline) -> Result<Self> {
        if !pipeline.is_fitted() {
            return Err(SpamError::NotFitted("Pipeline"));
        }
        check_servable(&pipeline)?;
        Ok(Self {
            pipeline: Arc::new(pipeline),
            normalizer: TextNormalizer::new(),
            trained_at: None,
        })
    }

    /// Wrap a pipeline without the readiness checks, so failing predictions can be exercised
    #[cfg(test)]
    pub(crate) fn unchecked(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            normalizer: TextNormalizer::new(),
            trained_at: None,
        }
    }

    /// Normalize raw text exactly as at training time, then classify it
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let cleaned = self.normalizer.clean(text);
        self.pipeline.predict_one(&cleaned)
    }

    pub fn model_kind(&self) -> ModelKind {
        self.pipeline.model_kind()
    }

    pub fn classes(&self) -> &[String] {
        self.pipeline.classes()
    }

    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.trained_at
    }
}

/// Every response carries a probability, so a model without one cannot serve
fn check_servable(pipeline: &Pipeline) -> Result<()> {
    if pipeline.supports_proba() {
        Ok(())
    } else {
        Err(SpamError::Artifact(format!(
            "{} model cannot produce probabilities; retrain with model.svm.probability enabled",
            pipeline.model_kind()
        )))
    }
}
