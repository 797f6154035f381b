use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::kinney::Classification;
use crate::storage::StoreError;
use crate::workflows::learning::artifact::{ArtifactStore, TrainingArtifact};
use crate::workflows::learning::domain::{FeedbackEntry, FeedbackId, FeedbackSubmission};
use crate::workflows::learning::feedback::FeedbackStore;
use crate::workflows::learning::forest::ForestConfig;
use crate::workflows::learning::pipeline::TrainingOptions;
use crate::workflows::learning::router::learning_router;
use crate::workflows::learning::service::LearningService;

/// Small forest and synthetic batch so training tests stay quick.
pub(super) fn quick_options() -> TrainingOptions {
    TrainingOptions {
        synthetic_samples: 200,
        forest: ForestConfig { trees: 15, max_depth: 8, ..ForestConfig::default() },
        dataset_dump: None,
        seed: 42,
    }
}

pub(super) fn submission() -> FeedbackSubmission {
    FeedbackSubmission {
        description: "Unpatched VPN appliance exposed to the internet".to_string(),
        category: "Program".to_string(),
        risk_type: "Cyber & InfoSec".to_string(),
        sector: "Technology".to_string(),
        severity: 5,
        frequency: 3,
        probability: 4,
        user_classification: Some(Classification::High),
        mitigation: "Patch cycle shortened to one week".to_string(),
    }
}

pub(super) type TestService = LearningService<MemoryFeedbackStore, MemoryArtifactStore>;

pub(super) fn build_service(
    options: TrainingOptions,
) -> (Arc<TestService>, Arc<MemoryFeedbackStore>, Arc<MemoryArtifactStore>) {
    let feedback = Arc::new(MemoryFeedbackStore::default());
    let artifacts = Arc::new(MemoryArtifactStore::default());
    let service = Arc::new(LearningService::new(feedback.clone(), artifacts.clone(), options));
    (service, feedback, artifacts)
}

pub(super) fn router_with_service(service: Arc<TestService>) -> axum::Router {
    learning_router(service)
}

#[derive(Default)]
pub(super) struct MemoryFeedbackStore {
    pub(super) entries: Mutex<Vec<FeedbackEntry>>,
}

impl FeedbackStore for MemoryFeedbackStore {
    fn append(&self, entry: FeedbackEntry) -> Result<(), StoreError> {
        self.entries.lock().expect("feedback mutex poisoned").push(entry);
        Ok(())
    }

    fn all(&self) -> Result<Vec<FeedbackEntry>, StoreError> {
        Ok(self.entries.lock().expect("feedback mutex poisoned").clone())
    }

    fn mark_used(&self, ids: &[FeedbackId]) -> Result<usize, StoreError> {
        let mut guard = self.entries.lock().expect("feedback mutex poisoned");
        let mut changed = 0;
        for entry in guard.iter_mut() {
            if !entry.used_for_training && ids.contains(&entry.id) {
                entry.used_for_training = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[derive(Default)]
pub(super) struct MemoryArtifactStore {
    pub(super) artifact: Mutex<Option<(TrainingArtifact, DateTime<Utc>)>>,
}

impl ArtifactStore for MemoryArtifactStore {
    fn load(&self) -> Result<TrainingArtifact, StoreError> {
        self.artifact
            .lock()
            .expect("artifact mutex poisoned")
            .as_ref()
            .map(|(artifact, _)| artifact.clone())
            .ok_or(StoreError::NotFound)
    }

    fn save(&self, artifact: &TrainingArtifact) -> Result<(), StoreError> {
        *self.artifact.lock().expect("artifact mutex poisoned") =
            Some((artifact.clone(), Utc::now()));
        Ok(())
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.artifact
            .lock()
            .expect("artifact mutex poisoned")
            .as_ref()
            .map(|(_, touched)| *touched)
    }
}

/// Artifact store whose save always fails; used to drive the failure path.
pub(super) struct ReadOnlyArtifactStore;

impl ArtifactStore for ReadOnlyArtifactStore {
    fn load(&self) -> Result<TrainingArtifact, StoreError> {
        Err(StoreError::NotFound)
    }

    fn save(&self, _artifact: &TrainingArtifact) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("artifact volume is read-only".to_string()))
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        None
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
