use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kinney::{self, Classification, Factor};

pub type AnalysisId = String;

/// One selected questionnaire option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub option_id: String,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        Self { question_id: question_id.into(), option_id: option_id.into() }
    }
}

/// Trace of one answer that actually contributed to a factor value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerContribution {
    pub question_id: String,
    pub option_id: String,
    pub contribution: u8,
    pub weight: u32,
}

/// Aggregated value of one factor together with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorAssessment {
    pub factor: Factor,
    pub value: u8,
    pub contributions: Vec<AnswerContribution>,
}

/// Per-factor contribution traces kept on every questionnaire analysis.
/// Residual analyses carry an empty breakdown for factors copied from the
/// parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    #[serde(default)]
    pub severity: Vec<AnswerContribution>,
    #[serde(default)]
    pub frequency: Vec<AnswerContribution>,
    #[serde(default)]
    pub probability: Vec<AnswerContribution>,
}

impl FactorBreakdown {
    pub fn from_assessments(
        severity: FactorAssessment,
        frequency: FactorAssessment,
        probability: FactorAssessment,
    ) -> Self {
        Self {
            severity: severity.contributions,
            frequency: frequency.contributions,
            probability: probability.contributions,
        }
    }

    pub fn for_factor(&self, factor: Factor) -> &[AnswerContribution] {
        match factor {
            Factor::Severity => &self.severity,
            Factor::Frequency => &self.frequency,
            Factor::Probability => &self.probability,
        }
    }
}

/// Deterministic scoring result. The classification and normalized score are
/// always derived from the ratings; construct through [`Evaluation::from_ratings`]
/// so no record can carry an inconsistent triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub severity: u8,
    pub frequency: u8,
    pub probability: u8,
    pub score: u16,
    pub normalized_score: u8,
    pub classification: Classification,
}

impl Evaluation {
    pub fn from_ratings(severity: u8, frequency: u8, probability: u8) -> Self {
        let severity = kinney::clamp_rating(severity);
        let frequency = kinney::clamp_rating(frequency);
        let probability = kinney::clamp_rating(probability);
        let score = kinney::score(severity, frequency, probability);
        Self {
            severity,
            frequency,
            probability,
            score,
            normalized_score: kinney::normalized_score(score),
            classification: kinney::classify(score),
        }
    }

    pub fn rating(&self, factor: Factor) -> u8 {
        match factor {
            Factor::Severity => self.severity,
            Factor::Frequency => self.frequency,
            Factor::Probability => self.probability,
        }
    }
}

/// How an analysis was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    Questionnaire,
    Residual,
}

impl AnalysisMethod {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisMethod::Questionnaire => "questionnaire",
            AnalysisMethod::Residual => "residual",
        }
    }
}

/// Persisted analysis, either a direct questionnaire scoring or a residual
/// re-scoring of a parent analysis after a mitigation measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub recorded_at: DateTime<Utc>,
    pub questionnaire_version: String,
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub risk_type: String,
    #[serde(default)]
    pub sector: String,
    pub method: AnalysisMethod,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub evaluation: Evaluation,
    #[serde(default)]
    pub breakdown: FactorBreakdown,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AnalysisId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_description: Option<String>,
}

/// Which factors a mitigation measure claims to improve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorImpacts {
    #[serde(default)]
    pub severity: bool,
    #[serde(default)]
    pub frequency: bool,
    #[serde(default)]
    pub probability: bool,
}

impl FactorImpacts {
    pub fn impacted(&self, factor: Factor) -> bool {
        match factor {
            Factor::Severity => self.severity,
            Factor::Frequency => self.frequency,
            Factor::Probability => self.probability,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.severity || self.frequency || self.probability)
    }
}

/// Fresh questionnaire answers per factor for a mitigation measure. Only the
/// impacted factors need entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorAnswerSets {
    #[serde(default)]
    pub severity: Vec<Answer>,
    #[serde(default)]
    pub frequency: Vec<Answer>,
    #[serde(default)]
    pub probability: Vec<Answer>,
}

impl FactorAnswerSets {
    pub fn for_factor(&self, factor: Factor) -> &[Answer] {
        match factor {
            Factor::Severity => &self.severity,
            Factor::Frequency => &self.frequency,
            Factor::Probability => &self.probability,
        }
    }
}

/// One mitigation measure applied against a parent analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationMeasure {
    pub description: String,
    pub impacts: FactorImpacts,
    #[serde(default)]
    pub answers: FactorAnswerSets,
}

/// Incoming questionnaire scoring request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireSubmission {
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub risk_type: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Incoming residual re-scoring request. Every measure is applied against
/// the same parent analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualRequest {
    pub parent_id: AnalysisId,
    pub measures: Vec<MitigationMeasure>,
}
