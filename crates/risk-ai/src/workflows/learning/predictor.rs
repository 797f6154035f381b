//! Serves classifications from the persisted artifact. The artifact is
//! loaded lazily on first use and cached for the process lifetime; a refresh
//! on disk is only observed after a restart.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use super::artifact::{ArtifactStore, TrainingArtifact};
use super::forest::FEATURE_COUNT;
use crate::kinney;
use crate::storage::StoreError;

/// Advisory classification from the statistical model. Never authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOpinion {
    pub classification: String,
    pub raw_label: usize,
}

pub struct PredictionService<A> {
    store: Arc<A>,
    cached: OnceLock<Arc<TrainingArtifact>>,
}

impl<A> PredictionService<A>
where
    A: ArtifactStore,
{
    pub fn new(store: Arc<A>) -> Self {
        Self { store, cached: OnceLock::new() }
    }

    /// Classifies the given factors. Categories and types the artifact has
    /// never seen fall back to the sentinel encoding instead of failing; a
    /// label index outside the encoder renders the raw number.
    pub fn predict(
        &self,
        severity: u8,
        frequency: u8,
        probability: u8,
        category: &str,
        risk_type: &str,
    ) -> Result<ModelOpinion, StoreError> {
        let artifact = self.artifact()?;
        let features: [f64; FEATURE_COUNT] = [
            f64::from(kinney::clamp_rating(severity)),
            f64::from(kinney::clamp_rating(frequency)),
            f64::from(kinney::clamp_rating(probability)),
            artifact.category_encoder.transform_or_unseen(category) as f64,
            artifact.type_encoder.transform_or_unseen(risk_type) as f64,
        ];

        let raw_label = artifact.model.predict(&features);
        let classification = match artifact.label_encoder.inverse(raw_label) {
            Some(label) => label.to_string(),
            None => raw_label.to_string(),
        };
        Ok(ModelOpinion { classification, raw_label })
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.get().is_some()
    }

    /// Returns the cached artifact, loading it on the first call. A failed
    /// load is not cached, so the next call retries.
    fn artifact(&self) -> Result<Arc<TrainingArtifact>, StoreError> {
        if let Some(artifact) = self.cached.get() {
            return Ok(Arc::clone(artifact));
        }
        let loaded = Arc::new(self.store.load()?);
        Ok(Arc::clone(self.cached.get_or_init(|| loaded)))
    }
}
