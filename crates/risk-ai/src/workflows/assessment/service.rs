use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::kinney::Factor;
use crate::storage::StoreError;

use super::aggregation::aggregate;
use super::domain::{
    AnalysisId, AnalysisMethod, AnalysisRecord, Evaluation, FactorBreakdown,
    QuestionnaireSubmission, ResidualRequest,
};
use super::questionnaire::QuestionBank;
use super::repository::{AnalysisPage, AnalysisRepository};
use super::residual::{recompute, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("analysis '{0}' not found")]
    UnknownAnalysis(AnalysisId),
}

static ANALYSIS_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Ids stay unique across restarts through the timestamp half and unique
/// within a second through the process sequence.
fn next_analysis_id(method: AnalysisMethod) -> AnalysisId {
    let sequence = ANALYSIS_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let prefix = match method {
        AnalysisMethod::Questionnaire => "qa",
        AnalysisMethod::Residual => "qr",
    };
    format!("{}-{}-{:04}", prefix, Utc::now().format("%Y%m%d%H%M%S"), sequence)
}

/// Questionnaire scoring and residual re-scoring over a pluggable record
/// store.
pub struct AnalysisService<R> {
    bank: Arc<QuestionBank>,
    repository: Arc<R>,
}

impl<R> AnalysisService<R>
where
    R: AnalysisRepository,
{
    pub fn new(bank: Arc<QuestionBank>, repository: Arc<R>) -> Self {
        Self { bank, repository }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Scores a questionnaire submission and persists the resulting analysis.
    pub fn analyze(
        &self,
        submission: QuestionnaireSubmission,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let severity = aggregate(&self.bank, Factor::Severity, &submission.answers);
        let frequency = aggregate(&self.bank, Factor::Frequency, &submission.answers);
        let probability = aggregate(&self.bank, Factor::Probability, &submission.answers);

        let evaluation =
            Evaluation::from_ratings(severity.value, frequency.value, probability.value);
        let record = AnalysisRecord {
            id: next_analysis_id(AnalysisMethod::Questionnaire),
            recorded_at: Utc::now(),
            questionnaire_version: self.bank.version().to_string(),
            description: submission.description,
            category: submission.category,
            risk_type: submission.risk_type,
            sector: submission.sector,
            method: AnalysisMethod::Questionnaire,
            answers: submission.answers,
            evaluation,
            breakdown: FactorBreakdown::from_assessments(severity, frequency, probability),
            justification: "Score derived from the weighted questionnaire answers (Kinney method)."
                .to_string(),
            parent_id: None,
            measure_description: None,
        };

        let record = self.repository.insert(record)?;
        info!(
            analysis = %record.id,
            score = record.evaluation.score,
            classification = record.evaluation.classification.label(),
            "questionnaire analysis recorded"
        );
        Ok(record)
    }

    /// Validates and scores every measure against the parent analysis, then
    /// persists the batch. A failing measure rejects the whole request before
    /// anything is written.
    pub fn residual(
        &self,
        request: ResidualRequest,
    ) -> Result<Vec<AnalysisRecord>, AnalysisServiceError> {
        let parent = self
            .repository
            .fetch(&request.parent_id)?
            .ok_or_else(|| AnalysisServiceError::UnknownAnalysis(request.parent_id.clone()))?;

        let evaluations = recompute(&self.bank, &parent.evaluation, &request.measures)?;

        let records: Vec<AnalysisRecord> = evaluations
            .into_iter()
            .zip(&request.measures)
            .map(|(evaluation, measure)| AnalysisRecord {
                id: next_analysis_id(AnalysisMethod::Residual),
                recorded_at: Utc::now(),
                questionnaire_version: self.bank.version().to_string(),
                description: parent.description.clone(),
                category: parent.category.clone(),
                risk_type: parent.risk_type.clone(),
                sector: parent.sector.clone(),
                method: AnalysisMethod::Residual,
                answers: Vec::new(),
                evaluation,
                breakdown: FactorBreakdown::default(),
                justification:
                    "Residual evaluation after a mitigation measure; untouched factors carry over from the parent analysis."
                        .to_string(),
                parent_id: Some(parent.id.clone()),
                measure_description: Some(measure.description.clone()),
            })
            .collect();

        let records = self.repository.insert_many(records)?;
        info!(
            parent = %parent.id,
            measures = records.len(),
            "residual analyses recorded"
        );
        Ok(records)
    }

    pub fn fetch(&self, id: &str) -> Result<AnalysisRecord, AnalysisServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| AnalysisServiceError::UnknownAnalysis(id.to_string()))
    }

    pub fn page(&self, offset: usize, limit: usize) -> Result<AnalysisPage, AnalysisServiceError> {
        Ok(self.repository.page(offset, limit)?)
    }

    pub fn remove(&self, id: &str) -> Result<(), AnalysisServiceError> {
        match self.repository.remove(id) {
            Ok(()) => {
                info!(analysis = %id, "analysis removed");
                Ok(())
            }
            Err(StoreError::NotFound) => {
                Err(AnalysisServiceError::UnknownAnalysis(id.to_string()))
            }
            Err(other) => Err(AnalysisServiceError::Store(other)),
        }
    }

    pub fn export(&self) -> Result<Vec<AnalysisRecord>, AnalysisServiceError> {
        Ok(self.repository.export()?)
    }

    pub fn import(&self, records: Vec<AnalysisRecord>) -> Result<usize, AnalysisServiceError> {
        let added = self.repository.import(records)?;
        info!(added, "analysis records imported");
        Ok(added)
    }
}
