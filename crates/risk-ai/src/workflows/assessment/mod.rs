//! Questionnaire-driven risk assessment: weighted aggregation of answers,
//! deterministic Kinney scoring, residual re-scoring after mitigation
//! measures, and a persisted trace of every analysis.

pub mod aggregation;
pub mod domain;
pub mod questionnaire;
pub mod reconcile;
pub mod repository;
pub mod residual;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregation::{aggregate, DEFAULT_RATING};
pub use domain::{
    AnalysisId, AnalysisMethod, AnalysisRecord, Answer, AnswerContribution, Evaluation,
    FactorAnswerSets, FactorAssessment, FactorBreakdown, FactorImpacts, MitigationMeasure,
    QuestionnaireSubmission, ResidualRequest,
};
pub use questionnaire::{Question, QuestionBank, QuestionOption, QUESTIONNAIRE_VERSION};
pub use reconcile::{
    compare, reconcile, AgreementLevel, Appraisal, ComparisonReport, DivergenceDirection,
    FactorComparison, ReconciledOpinions, ScoreComparison,
};
pub use repository::{AnalysisPage, AnalysisRepository, JsonFileAnalysisRepository};
pub use residual::{recompute, ValidationError};
pub use router::assessment_router;
pub use service::{AnalysisService, AnalysisServiceError};
