//! Weighted aggregation of questionnaire answers into one factor rating.

use crate::kinney::{Factor, MAX_RATING, MIN_RATING};

use super::domain::{Answer, AnswerContribution, FactorAssessment};
use super::questionnaire::QuestionBank;

/// Rating used when no answer carries any weight for a factor.
pub const DEFAULT_RATING: u8 = MIN_RATING;

/// Folds the answers targeting `factor` into a single rating in `[1, 5]`.
///
/// Answers referencing an unknown question or option, or a question bound to
/// a different factor, are skipped without contributing weight. The weighted
/// mean is rounded half-up and clamped onto the rating scale; when nothing
/// contributed, the rating falls back to [`DEFAULT_RATING`].
pub fn aggregate(bank: &QuestionBank, factor: Factor, answers: &[Answer]) -> FactorAssessment {
    let mut weighted_sum = 0.0_f64;
    let mut weight_total = 0.0_f64;
    let mut contributions = Vec::new();

    for answer in answers {
        let Some(question) = bank.question(&answer.question_id) else {
            continue;
        };
        if question.factor != factor {
            continue;
        }
        let Some(option) = question.option(&answer.option_id) else {
            continue;
        };

        let weight = f64::from(question.weight);
        weighted_sum += f64::from(option.contribution) * weight;
        weight_total += weight;
        contributions.push(AnswerContribution {
            question_id: question.id.clone(),
            option_id: option.id.clone(),
            contribution: option.contribution,
            weight: question.weight,
        });
    }

    let value = if weight_total <= 0.0 {
        DEFAULT_RATING
    } else {
        let mean = weighted_sum / weight_total;
        (mean.round() as u8).clamp(MIN_RATING, MAX_RATING)
    };

    FactorAssessment { factor, value, contributions }
}
