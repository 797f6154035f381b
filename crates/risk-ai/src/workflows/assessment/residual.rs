//! Residual re-scoring after mitigation measures.
//!
//! Each measure is applied independently against the same parent evaluation;
//! residual evaluations are never chained. A measure must declare at least
//! one impacted factor, and every impacted factor needs fresh answers that
//! actually aggregate; factors it does not touch keep the parent's rating.

use crate::kinney::Factor;

use super::aggregation::aggregate;
use super::domain::{Evaluation, MitigationMeasure};
use super::questionnaire::QuestionBank;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("measure #{index}: at least one factor must be marked as impacted")]
    NoImpactedFactor { index: usize },
    #[error("measure #{index}: fresh answers are required for {}", .factor.describe())]
    MissingFactorAnswers { index: usize, factor: Factor },
    #[error("measure #{index}: answers for {} carry no weight", .factor.describe())]
    UnscorableFactor { index: usize, factor: Factor },
}

/// Validates and recomputes every measure against `parent`. All measures are
/// checked before any result is returned, so a failing measure rejects the
/// whole batch and nothing partial can be persisted.
pub fn recompute(
    bank: &QuestionBank,
    parent: &Evaluation,
    measures: &[MitigationMeasure],
) -> Result<Vec<Evaluation>, ValidationError> {
    measures
        .iter()
        .enumerate()
        .map(|(position, measure)| recompute_measure(bank, parent, measure, position + 1))
        .collect()
}

fn recompute_measure(
    bank: &QuestionBank,
    parent: &Evaluation,
    measure: &MitigationMeasure,
    index: usize,
) -> Result<Evaluation, ValidationError> {
    if measure.impacts.is_empty() {
        return Err(ValidationError::NoImpactedFactor { index });
    }

    let mut ratings = [parent.severity, parent.frequency, parent.probability];
    for (slot, factor) in Factor::ALL.into_iter().enumerate() {
        if !measure.impacts.impacted(factor) {
            continue;
        }
        let answers = measure.answers.for_factor(factor);
        if answers.is_empty() {
            return Err(ValidationError::MissingFactorAnswers { index, factor });
        }
        let assessment = aggregate(bank, factor, answers);
        if assessment.contributions.is_empty() {
            return Err(ValidationError::UnscorableFactor { index, factor });
        }
        ratings[slot] = assessment.value;
    }

    Ok(Evaluation::from_ratings(ratings[0], ratings[1], ratings[2]))
}
