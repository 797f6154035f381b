//! Learning loop around the deterministic scorer: analyst feedback intake,
//! dataset assembly with synthetic padding, a guarded retraining pipeline
//! and the prediction service that serves the fitted classifier.

pub mod artifact;
pub mod domain;
pub mod encoder;
pub mod feedback;
pub mod forest;
pub mod guard;
pub mod pipeline;
pub mod predictor;
pub mod router;
pub mod scenarios;
pub mod service;
pub mod synthetic;

#[cfg(test)]
mod tests;

pub use artifact::{ArtifactStore, JsonFileArtifactStore, TrainingArtifact};
pub use domain::{
    FeedbackEntry, FeedbackId, FeedbackStats, FeedbackSubmission, TrainingMetrics,
    TrainingReport, TrainingRow, TrainingStatus,
};
pub use encoder::{LabelEncoder, UNSEEN_INDEX};
pub use feedback::{FeedbackStore, JsonFileFeedbackStore};
pub use forest::{DecisionTree, ForestConfig, RandomForest, FEATURE_COUNT};
pub use guard::{TrainingGuard, TrainingPermit};
pub use pipeline::{
    TrainingOptions, TrainingPipeline, FEEDBACK_REPLICATION, MIN_TRAINING_ROWS,
    SCENARIO_REPLICATION,
};
pub use predictor::{ModelOpinion, PredictionService};
pub use router::learning_router;
pub use scenarios::{standard_scenarios, Scenario};
pub use service::LearningService;
pub use synthetic::SyntheticGenerator;
