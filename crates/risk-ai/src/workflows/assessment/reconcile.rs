//! Reconciliation between the deterministic evaluation and advisory opinions,
//! plus the human-vs-advisor comparison views.

use serde::{Deserialize, Serialize};

use crate::kinney::{Classification, Factor};

use super::domain::Evaluation;

/// Score distance inside which matching classifications count as strong
/// agreement.
pub const STRONG_SCORE_MARGIN: u16 = 10;
/// Score distance inside which diverging classifications still count as
/// moderate agreement (borderline band crossings).
pub const MODERATE_SCORE_MARGIN: u16 = 25;

/// Review threshold for a single factor gap.
pub const FACTOR_GAP_THRESHOLD: u8 = 2;

/// Outcome of merging the deterministic classification with the advisory
/// ones. The deterministic band is final; the others are annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledOpinions {
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor_classification: Option<String>,
}

/// Resolves conflicting classifications. The deterministic one always wins;
/// advisory labels ride along untouched for display.
pub fn reconcile(
    deterministic: Classification,
    model_classification: Option<String>,
    advisor_classification: Option<String>,
) -> ReconciledOpinions {
    ReconciledOpinions {
        classification: deterministic,
        model_classification,
        advisor_classification,
    }
}

/// One side of a comparison: ratings plus the label used for matching. The
/// label defaults to the derived classification but an analyst may pin their
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    pub severity: u8,
    pub frequency: u8,
    pub probability: u8,
    pub score: u16,
    pub normalized_score: u8,
    pub classification: Classification,
}

impl Appraisal {
    pub fn from_ratings(severity: u8, frequency: u8, probability: u8) -> Self {
        Evaluation::from_ratings(severity, frequency, probability).into()
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    fn rating(&self, factor: Factor) -> u8 {
        match factor {
            Factor::Severity => self.severity,
            Factor::Frequency => self.frequency,
            Factor::Probability => self.probability,
        }
    }
}

impl From<Evaluation> for Appraisal {
    fn from(evaluation: Evaluation) -> Self {
        Self {
            severity: evaluation.severity,
            frequency: evaluation.frequency,
            probability: evaluation.probability,
            score: evaluation.score,
            normalized_score: evaluation.normalized_score,
            classification: evaluation.classification,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceDirection {
    Identical,
    HumanHigher,
    AdvisorHigher,
}

impl DivergenceDirection {
    pub fn label(&self) -> &'static str {
        match self {
            DivergenceDirection::Identical => "identical",
            DivergenceDirection::HumanHigher => "human higher",
            DivergenceDirection::AdvisorHigher => "advisor higher",
        }
    }
}

/// Per-factor rating comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorComparison {
    pub human: u8,
    pub advisor: u8,
    pub difference: u8,
    pub assessment: DivergenceDirection,
}

impl FactorComparison {
    fn between(human: u8, advisor: u8) -> Self {
        let assessment = match human.cmp(&advisor) {
            std::cmp::Ordering::Equal => DivergenceDirection::Identical,
            std::cmp::Ordering::Greater => DivergenceDirection::HumanHigher,
            std::cmp::Ordering::Less => DivergenceDirection::AdvisorHigher,
        };
        Self { human, advisor, difference: human.abs_diff(advisor), assessment }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComparison {
    pub human: u16,
    pub advisor: u16,
    pub difference: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementLevel {
    Strong,
    Moderate,
    Weak,
}

impl AgreementLevel {
    pub fn label(&self) -> &'static str {
        match self {
            AgreementLevel::Strong => "strong",
            AgreementLevel::Moderate => "moderate",
            AgreementLevel::Weak => "weak",
        }
    }
}

/// Full human-vs-advisor comparison. A view over two appraisals; authority
/// stays with the deterministic classification regardless of what it shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub severity: FactorComparison,
    pub frequency: FactorComparison,
    pub probability: FactorComparison,
    pub score: ScoreComparison,
    pub classifications_match: bool,
    pub agreement: AgreementLevel,
    pub agreement_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_divergence_factor: Option<Factor>,
    pub recommendations: Vec<String>,
}

pub fn compare(human: &Appraisal, advisor: &Appraisal) -> ComparisonReport {
    let severity = FactorComparison::between(human.severity, advisor.severity);
    let frequency = FactorComparison::between(human.frequency, advisor.frequency);
    let probability = FactorComparison::between(human.probability, advisor.probability);
    let score = ScoreComparison {
        human: human.score,
        advisor: advisor.score,
        difference: human.score.abs_diff(advisor.score),
    };

    let classifications_match = human.classification == advisor.classification;
    let (agreement, agreement_message) =
        agreement_level(classifications_match, score.difference);

    ComparisonReport {
        severity,
        frequency,
        probability,
        score,
        classifications_match,
        agreement,
        agreement_message: agreement_message.to_string(),
        max_divergence_factor: max_divergence_factor(human, advisor),
        recommendations: recommendations(human, advisor, classifications_match),
    }
}

fn agreement_level(matched: bool, score_difference: u16) -> (AgreementLevel, &'static str) {
    if matched && score_difference <= STRONG_SCORE_MARGIN {
        (
            AgreementLevel::Strong,
            "Human analysis and the advisor agree.",
        )
    } else if matched {
        (
            AgreementLevel::Moderate,
            "Classifications agree but the scores differ noticeably.",
        )
    } else if score_difference <= MODERATE_SCORE_MARGIN {
        (
            AgreementLevel::Moderate,
            "Scores are close but land in different classification bands.",
        )
    } else {
        (
            AgreementLevel::Weak,
            "Significant divergence between the human analysis and the advisor; a review is recommended.",
        )
    }
}

/// Factor with the widest rating gap, first of G/F/P on ties, omitted when
/// every rating matches.
fn max_divergence_factor(human: &Appraisal, advisor: &Appraisal) -> Option<Factor> {
    let mut best: Option<(Factor, u8)> = None;
    for factor in Factor::ALL {
        let gap = human.rating(factor).abs_diff(advisor.rating(factor));
        if gap > 0 && best.map_or(true, |(_, widest)| gap > widest) {
            best = Some((factor, gap));
        }
    }
    best.map(|(factor, _)| factor)
}

fn recommendations(human: &Appraisal, advisor: &Appraisal, matched: bool) -> Vec<String> {
    let mut notes = Vec::new();

    if !matched {
        if human.classification == Classification::Low {
            notes.push(
                "The advisor rates this risk more severely; check whether any impact was underestimated."
                    .to_string(),
            );
        } else if human.classification == Classification::High {
            notes.push(
                "The advisor rates this risk less severely; check whether existing mitigation measures were overlooked."
                    .to_string(),
            );
        }
    }

    for factor in Factor::ALL {
        let gap = human.rating(factor).abs_diff(advisor.rating(factor));
        if gap >= FACTOR_GAP_THRESHOLD {
            let revisit = match factor {
                Factor::Severity => "revisit the potential impact",
                Factor::Frequency => "revisit the exposure frequency",
                Factor::Probability => "revisit the likelihood",
            };
            notes.push(format!(
                "Gap of {} points on {}; {}.",
                gap,
                factor.describe(),
                revisit
            ));
        }
    }

    notes
}
