use super::common::*;
use std::sync::Arc;

use chrono::Utc;

use crate::storage::StoreError;
use crate::workflows::learning::artifact::{ArtifactStore, TrainingArtifact};
use crate::workflows::learning::domain::TrainingMetrics;
use crate::workflows::learning::encoder::LabelEncoder;
use crate::workflows::learning::forest::{ForestConfig, RandomForest};
use crate::workflows::learning::predictor::PredictionService;

fn trained_store() -> Arc<MemoryArtifactStore> {
    let (service, _feedback, artifacts) = build_service(quick_options());
    service.record_feedback(submission()).expect("feedback stored");
    assert!(service.retrain(false).is_completed());
    artifacts
}

#[test]
fn predictions_track_the_deterministic_bands_on_clear_cases() {
    let predictor = PredictionService::new(trained_store());

    let low = predictor.predict(1, 1, 1, "Program", "Commercial").expect("prediction");
    assert_eq!(low.classification, "Low");

    let high = predictor.predict(5, 5, 5, "Program", "Cyber & InfoSec").expect("prediction");
    assert_eq!(high.classification, "High");
}

#[test]
fn unseen_category_degrades_to_the_sentinel_encoding() {
    let predictor = PredictionService::new(trained_store());

    let opinion = predictor
        .predict(5, 5, 5, "Aerospace", "Space Weather")
        .expect("unseen labels must not fail the prediction");
    assert!(["Low", "Medium", "High"].contains(&opinion.classification.as_str()));
    assert!(opinion.raw_label < 3);
}

#[test]
fn missing_artifact_is_retried_on_the_next_call() {
    let store = Arc::new(MemoryArtifactStore::default());
    let predictor = PredictionService::new(store.clone());

    assert!(matches!(
        predictor.predict(3, 3, 3, "Program", "Technical"),
        Err(StoreError::NotFound)
    ));
    assert!(!predictor.is_loaded());

    let trained = trained_store();
    store.save(&trained.load().expect("artifact present")).expect("seed store");

    assert!(predictor.predict(3, 3, 3, "Program", "Technical").is_ok());
    assert!(predictor.is_loaded());
}

#[test]
fn loaded_artifact_is_cached_for_the_process_lifetime() {
    let store = trained_store();
    let predictor = PredictionService::new(store.clone());
    predictor.predict(2, 2, 2, "Program", "Technical").expect("first prediction");

    // A wiped store no longer matters once the artifact is cached.
    *store.artifact.lock().expect("artifact mutex poisoned") = None;
    assert!(predictor.predict(2, 2, 2, "Program", "Technical").is_ok());
}

#[test]
fn undecodable_label_is_rendered_as_its_raw_index() {
    let mut samples = Vec::new();
    let mut labels = Vec::new();
    for copy in 0..10 {
        let jitter = f64::from(copy) * 0.01;
        samples.push([1.0 + jitter, 1.0, 1.0, 0.0, 0.0]);
        labels.push(0);
        samples.push([3.0 + jitter, 3.0, 3.0, 0.0, 0.0]);
        labels.push(1);
        samples.push([5.0 + jitter, 5.0, 5.0, 0.0, 0.0]);
        labels.push(2);
    }
    let config = ForestConfig { trees: 9, max_depth: 6, ..ForestConfig::default() };
    let artifact = TrainingArtifact {
        trained_at: Utc::now(),
        model: RandomForest::fit(&config, &samples, &labels, 3),
        category_encoder: LabelEncoder::fit(["Program"]),
        type_encoder: LabelEncoder::fit(["Technical"]),
        // Deliberately too small to decode the upper labels.
        label_encoder: LabelEncoder::fit(["Low"]),
        metrics: TrainingMetrics {
            train_accuracy: 1.0,
            test_accuracy: 1.0,
            training_samples: 24,
            test_samples: 6,
            total_samples: 30,
        },
    };
    let store = Arc::new(MemoryArtifactStore::default());
    store.save(&artifact).expect("seed store");

    let predictor = PredictionService::new(store);
    let opinion = predictor.predict(5, 5, 5, "Program", "Technical").expect("prediction");
    assert_eq!(opinion.raw_label, 2);
    assert_eq!(opinion.classification, "2");
}
