use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::artifact::ArtifactStore;
use super::domain::{
    FeedbackEntry, FeedbackId, FeedbackStats, FeedbackSubmission, TrainingReport, TrainingStatus,
};
use super::feedback::FeedbackStore;
use super::guard::TrainingGuard;
use super::pipeline::{TrainingOptions, TrainingPipeline};
use super::scenarios::Scenario;
use crate::kinney;
use crate::storage::StoreError;

static FEEDBACK_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Ids stay unique across restarts through the timestamp half and unique
/// within a second through the process sequence.
fn next_feedback_id() -> FeedbackId {
    let sequence = FEEDBACK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("fb-{}-{:04}", Utc::now().format("%Y%m%d%H%M%S"), sequence)
}

/// Feedback intake, training status and retraining over pluggable stores.
pub struct LearningService<F, A> {
    feedback: Arc<F>,
    artifacts: Arc<A>,
    guard: Arc<TrainingGuard>,
    pipeline: TrainingPipeline<F, A>,
}

impl<F, A> LearningService<F, A>
where
    F: FeedbackStore,
    A: ArtifactStore,
{
    pub fn new(feedback: Arc<F>, artifacts: Arc<A>, options: TrainingOptions) -> Self {
        let guard = Arc::new(TrainingGuard::new());
        let pipeline = TrainingPipeline::new(
            Arc::clone(&feedback),
            Arc::clone(&artifacts),
            Arc::clone(&guard),
            options,
        );
        Self { feedback, artifacts, guard, pipeline }
    }

    /// Replaces the curated scenario set; mostly useful for tests.
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.pipeline = self.pipeline.with_scenarios(scenarios);
        self
    }

    pub fn guard(&self) -> Arc<TrainingGuard> {
        Arc::clone(&self.guard)
    }

    pub fn scenario_count(&self) -> usize {
        self.pipeline.scenario_count()
    }

    /// Stores one analyst verdict. Ratings are clamped, the deterministic
    /// classification is computed for reference and the analyst's own call
    /// defaults to it when absent.
    pub fn record_feedback(
        &self,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackEntry, StoreError> {
        let severity = kinney::clamp_rating(submission.severity);
        let frequency = kinney::clamp_rating(submission.frequency);
        let probability = kinney::clamp_rating(submission.probability);
        let score = kinney::score(severity, frequency, probability);
        let computed = kinney::classify(score);

        let entry = FeedbackEntry {
            id: next_feedback_id(),
            recorded_at: Utc::now(),
            description: submission.description,
            category: submission.category,
            risk_type: submission.risk_type,
            sector: submission.sector,
            severity,
            frequency,
            probability,
            score,
            computed_classification: computed,
            user_classification: submission.user_classification.unwrap_or(computed),
            mitigation: submission.mitigation,
            used_for_training: false,
        };
        self.feedback.append(entry.clone())?;
        info!(
            feedback_id = %entry.id,
            classification = entry.user_classification.label(),
            "feedback recorded"
        );
        Ok(entry)
    }

    pub fn stats(&self) -> Result<FeedbackStats, StoreError> {
        Ok(FeedbackStats::from_entries(&self.feedback.all()?))
    }

    pub fn status(&self) -> Result<TrainingStatus, StoreError> {
        Ok(TrainingStatus {
            is_training: self.guard.is_training(),
            feedback: self.stats()?,
            scenario_count: self.pipeline.scenario_count(),
            artifact_exists: self.artifacts.exists(),
            artifact_last_modified: self.artifacts.last_modified(),
        })
    }

    /// Runs the pipeline, except that a non-forced request with nothing new
    /// to learn from is answered without touching the guard.
    pub fn retrain(&self, force: bool) -> TrainingReport {
        if !force {
            match self.stats() {
                Ok(stats)
                    if stats.pending_training == 0 && self.pipeline.scenario_count() == 0 =>
                {
                    info!("retrain skipped, no new training data");
                    return TrainingReport::NoNewData;
                }
                Ok(_) => {}
                Err(source) => return TrainingReport::Failed { message: source.to_string() },
            }
        }
        self.pipeline.retrain(force)
    }
}
