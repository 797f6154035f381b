//! Persistence for the trained classifier. The forest, the encoders fitted
//! alongside it and the evaluation metrics travel as one JSON document so a
//! reload can never pair a model with stale encoders.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::TrainingMetrics;
use super::encoder::LabelEncoder;
use super::forest::RandomForest;
use crate::storage::{self, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingArtifact {
    pub trained_at: DateTime<Utc>,
    pub model: RandomForest,
    pub category_encoder: LabelEncoder,
    pub type_encoder: LabelEncoder,
    pub label_encoder: LabelEncoder,
    pub metrics: TrainingMetrics,
}

pub trait ArtifactStore: Send + Sync {
    fn load(&self) -> Result<TrainingArtifact, StoreError>;
    fn save(&self, artifact: &TrainingArtifact) -> Result<(), StoreError>;
    fn last_modified(&self) -> Option<DateTime<Utc>>;

    fn exists(&self) -> bool {
        self.last_modified().is_some()
    }
}

/// Artifact persisted as a single JSON document, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileArtifactStore {
    path: PathBuf,
}

impl JsonFileArtifactStore {
    pub const FILE_NAME: &'static str = "risk_classifier.json";

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir.into().join(Self::FILE_NAME))
    }
}

impl ArtifactStore for JsonFileArtifactStore {
    fn load(&self) -> Result<TrainingArtifact, StoreError> {
        storage::load_document(&self.path)
    }

    fn save(&self, artifact: &TrainingArtifact) -> Result<(), StoreError> {
        storage::save_document(&self.path, artifact)
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        let metadata = std::fs::metadata(&self.path).ok()?;
        let modified = metadata.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}
