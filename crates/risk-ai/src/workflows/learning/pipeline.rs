//! The retraining pipeline. One run assembles the replicated scenario and
//! feedback rows plus a fresh synthetic batch, fits the encoders and the
//! forest, evaluates, replaces the artifact atomically and flags the consumed
//! feedback. The guard is held as an RAII permit, so it is released on every
//! exit path including failures.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{error, info, warn};

use super::artifact::{ArtifactStore, TrainingArtifact};
use super::domain::{FeedbackId, TrainingMetrics, TrainingReport, TrainingRow};
use super::encoder::LabelEncoder;
use super::feedback::FeedbackStore;
use super::forest::{ForestConfig, RandomForest, FEATURE_COUNT};
use super::guard::TrainingGuard;
use super::scenarios::{standard_scenarios, Scenario};
use super::synthetic::SyntheticGenerator;
use crate::storage::StoreError;

/// Curated scenarios are replicated to establish a strong prior.
pub const SCENARIO_REPLICATION: usize = 20;
/// Feedback reflects corrected human judgment and is weighted heaviest.
pub const FEEDBACK_REPLICATION: usize = 50;
/// Below this combined row count a non-forced run declines to train.
pub const MIN_TRAINING_ROWS: usize = 100;

const TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub synthetic_samples: usize,
    pub forest: ForestConfig,
    /// When set, the combined training rows are also written there as CSV.
    pub dataset_dump: Option<std::path::PathBuf>,
    /// Seed for the synthetic batch; the split and the forest use the seed
    /// carried by `forest`.
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self { synthetic_samples: 2000, forest: ForestConfig::default(), dataset_dump: None, seed: 42 }
    }
}

pub struct TrainingPipeline<F, A> {
    feedback: Arc<F>,
    artifacts: Arc<A>,
    guard: Arc<TrainingGuard>,
    scenarios: Vec<Scenario>,
    options: TrainingOptions,
}

impl<F, A> TrainingPipeline<F, A>
where
    F: FeedbackStore,
    A: ArtifactStore,
{
    pub fn new(
        feedback: Arc<F>,
        artifacts: Arc<A>,
        guard: Arc<TrainingGuard>,
        options: TrainingOptions,
    ) -> Self {
        Self { feedback, artifacts, guard, scenarios: standard_scenarios(), options }
    }

    /// Replaces the curated scenario set; mostly useful for tests and
    /// offline experiments.
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Runs one training pass. Non-forced runs bail out with `Busy` when
    /// another run holds the guard and with `InsufficientData` when the
    /// combined dataset is too small; `force` waits for the guard and skips
    /// the sufficiency check.
    pub fn retrain(&self, force: bool) -> TrainingReport {
        let _permit = if force {
            self.guard.acquire()
        } else {
            match self.guard.try_acquire() {
                Some(permit) => permit,
                None => {
                    info!("retrain request rejected, a training run is already in flight");
                    return TrainingReport::Busy;
                }
            }
        };

        match self.run(force) {
            Ok(report) => report,
            Err(source) => {
                error!(error = %source, "training run failed");
                TrainingReport::Failed { message: source.to_string() }
            }
        }
    }

    fn run(&self, force: bool) -> Result<TrainingReport, StoreError> {
        let entries = self.feedback.all()?;

        let mut rows: Vec<TrainingRow> = Vec::new();
        for scenario in &self.scenarios {
            let row = scenario.training_row();
            for _ in 0..SCENARIO_REPLICATION {
                rows.push(row.clone());
            }
        }
        for entry in &entries {
            let row = entry.training_row();
            for _ in 0..FEEDBACK_REPLICATION {
                rows.push(row.clone());
            }
        }
        rows.extend(SyntheticGenerator::new(self.options.seed).generate(self.options.synthetic_samples));

        if rows.is_empty() || (!force && rows.len() < MIN_TRAINING_ROWS) {
            info!(rows = rows.len(), "declining to train on an insufficient dataset");
            return Ok(TrainingReport::InsufficientData { rows: rows.len() });
        }

        if let Some(path) = &self.options.dataset_dump {
            if let Err(source) = dump_dataset(path, &rows) {
                warn!(error = %source, path = %path.display(), "dataset dump failed, continuing");
            }
        }

        let category_encoder = LabelEncoder::fit(rows.iter().map(|row| row.category.as_str()));
        let type_encoder = LabelEncoder::fit(rows.iter().map(|row| row.risk_type.as_str()));
        let label_encoder = LabelEncoder::fit(rows.iter().map(|row| row.classification.label()));

        let samples: Vec<[f64; FEATURE_COUNT]> = rows
            .iter()
            .map(|row| encode_features(row, &category_encoder, &type_encoder))
            .collect();
        let labels: Vec<usize> = rows
            .iter()
            .map(|row| label_encoder.transform_or_unseen(row.classification.label()))
            .collect();

        let (train_indices, test_indices) = stratified_split(&labels, self.options.forest.seed);
        let train_samples: Vec<[f64; FEATURE_COUNT]> =
            train_indices.iter().map(|&index| samples[index]).collect();
        let train_labels: Vec<usize> = train_indices.iter().map(|&index| labels[index]).collect();
        let test_samples: Vec<[f64; FEATURE_COUNT]> =
            test_indices.iter().map(|&index| samples[index]).collect();
        let test_labels: Vec<usize> = test_indices.iter().map(|&index| labels[index]).collect();

        let forest =
            RandomForest::fit(&self.options.forest, &train_samples, &train_labels, label_encoder.len());
        let metrics = TrainingMetrics {
            train_accuracy: round4(forest.accuracy(&train_samples, &train_labels)),
            test_accuracy: round4(forest.accuracy(&test_samples, &test_labels)),
            training_samples: train_samples.len(),
            test_samples: test_samples.len(),
            total_samples: rows.len(),
        };

        let artifact = TrainingArtifact {
            trained_at: Utc::now(),
            model: forest,
            category_encoder,
            type_encoder,
            label_encoder: label_encoder.clone(),
            metrics: metrics.clone(),
        };
        self.artifacts.save(&artifact)?;

        let consumed: Vec<FeedbackId> = entries.iter().map(|entry| entry.id.clone()).collect();
        if !consumed.is_empty() {
            let flagged = self.feedback.mark_used(&consumed)?;
            info!(flagged, "feedback entries consumed by this run");
        }

        info!(
            train_accuracy = metrics.train_accuracy,
            test_accuracy = metrics.test_accuracy,
            total_samples = metrics.total_samples,
            "training run completed"
        );
        Ok(TrainingReport::Completed {
            metrics,
            classes: label_encoder.classes().to_vec(),
            finished_at: Utc::now(),
        })
    }
}

fn encode_features(
    row: &TrainingRow,
    category_encoder: &LabelEncoder,
    type_encoder: &LabelEncoder,
) -> [f64; FEATURE_COUNT] {
    [
        f64::from(row.severity),
        f64::from(row.frequency),
        f64::from(row.probability),
        category_encoder.transform_or_unseen(&row.category) as f64,
        type_encoder.transform_or_unseen(&row.risk_type) as f64,
    ]
}

/// Per-class 80/20 split. Every class keeps at least one training sample;
/// singleton classes stay entirely on the training side.
fn stratified_split(labels: &[usize], seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut by_label: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(index);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut group in by_label.into_values() {
        group.shuffle(&mut rng);
        let held_out = if group.len() < 2 {
            0
        } else {
            ((group.len() as f64 * TEST_FRACTION).round() as usize).clamp(1, group.len() - 1)
        };
        test.extend_from_slice(&group[..held_out]);
        train.extend_from_slice(&group[held_out..]);
    }
    (train, test)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn dump_dataset(path: &Path, rows: &[TrainingRow]) -> Result<(), csv::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
