use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kinney::{self, Classification};

pub type FeedbackId = String;

/// One row of the classifier training dataset. The label is always the
/// classification column; score is kept for the dataset dump only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub severity: u8,
    pub frequency: u8,
    pub probability: u8,
    pub category: String,
    pub risk_type: String,
    pub score: u16,
    pub classification: Classification,
}

impl TrainingRow {
    pub fn from_ratings(
        severity: u8,
        frequency: u8,
        probability: u8,
        category: impl Into<String>,
        risk_type: impl Into<String>,
    ) -> Self {
        let severity = kinney::clamp_rating(severity);
        let frequency = kinney::clamp_rating(frequency);
        let probability = kinney::clamp_rating(probability);
        let score = kinney::score(severity, frequency, probability);
        Self {
            severity,
            frequency,
            probability,
            category: category.into(),
            risk_type: risk_type.into(),
            score,
            classification: kinney::classify(score),
        }
    }
}

/// Analyst feedback awaiting (or already consumed by) a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: FeedbackId,
    pub recorded_at: DateTime<Utc>,
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub risk_type: String,
    #[serde(default)]
    pub sector: String,
    pub severity: u8,
    pub frequency: u8,
    pub probability: u8,
    pub score: u16,
    pub computed_classification: Classification,
    /// The analyst's verdict; the training label. Defaults to the computed
    /// classification when the analyst does not override it.
    pub user_classification: Classification,
    #[serde(default)]
    pub mitigation: String,
    pub used_for_training: bool,
}

impl FeedbackEntry {
    pub fn training_row(&self) -> TrainingRow {
        TrainingRow {
            severity: self.severity,
            frequency: self.frequency,
            probability: self.probability,
            category: self.category.clone(),
            risk_type: self.risk_type.clone(),
            score: self.score,
            classification: self.user_classification,
        }
    }
}

/// Incoming feedback payload. Ratings are clamped on intake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub risk_type: String,
    #[serde(default)]
    pub sector: String,
    pub severity: u8,
    pub frequency: u8,
    pub probability: u8,
    #[serde(default)]
    pub user_classification: Option<Classification>,
    #[serde(default)]
    pub mitigation: String,
}

/// Aggregated view over the feedback store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total: usize,
    pub used_for_training: usize,
    pub pending_training: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_classification: BTreeMap<String, usize>,
}

impl FeedbackStats {
    pub fn from_entries(entries: &[FeedbackEntry]) -> Self {
        let mut stats = Self { total: entries.len(), ..Self::default() };
        for entry in entries {
            if entry.used_for_training {
                stats.used_for_training += 1;
            } else {
                stats.pending_training += 1;
            }
            *stats.by_category.entry(entry.category.clone()).or_default() += 1;
            *stats.by_type.entry(entry.risk_type.clone()).or_default() += 1;
            *stats
                .by_classification
                .entry(entry.user_classification.label().to_string())
                .or_default() += 1;
        }
        stats
    }
}

/// Snapshot reported by the training status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub is_training: bool,
    pub feedback: FeedbackStats,
    pub scenario_count: usize,
    pub artifact_exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_last_modified: Option<DateTime<Utc>>,
}

/// Accuracy and volume metrics of a completed training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub training_samples: usize,
    pub test_samples: usize,
    pub total_samples: usize,
}

/// Outcome of a retraining request. Busy, insufficient data and no-new-data
/// are deliberate no-ops, not errors; only `Failed` reports a broken run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainingReport {
    Completed {
        metrics: TrainingMetrics,
        classes: Vec<String>,
        finished_at: DateTime<Utc>,
    },
    Busy,
    InsufficientData {
        rows: usize,
    },
    NoNewData,
    Failed {
        message: String,
    },
}

impl TrainingReport {
    pub fn is_completed(&self) -> bool {
        matches!(self, TrainingReport::Completed { .. })
    }
}
