//! Seam for the language-model risk advisor. The service never talks to a
//! provider directly; it consumes this trait and treats the advisor as an
//! annotation source whose classification never overrides the deterministic
//! one.

use serde::{Deserialize, Serialize};

use crate::kinney::clamp_rating;

/// Risk context handed to the advisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub description: String,
    pub category: String,
    pub risk_type: String,
    #[serde(default)]
    pub sector: String,
}

/// Structured opinion returned by an advisor implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorOpinion {
    pub severity: u8,
    pub frequency: u8,
    pub probability: u8,
    /// Classification label as phrased by the advisor, advisory only.
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub justification: String,
}

impl AdvisorOpinion {
    /// Ratings as stored can come from an over-eager upstream; callers score
    /// on the clamped view.
    pub fn clamped_ratings(&self) -> (u8, u8, u8) {
        (
            clamp_rating(self.severity),
            clamp_rating(self.frequency),
            clamp_rating(self.probability),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    /// The upstream could not be reached or gave no answer within the
    /// implementation's retry budget.
    #[error("risk advisor unavailable: {0}")]
    Unavailable(String),
    /// The upstream answered with a payload that does not carry the expected
    /// structured opinion.
    #[error("risk advisor returned a malformed payload: {0}")]
    Malformed(String),
}

/// Implementations perform their own bounded retries and return either a
/// structured opinion or a definite error; they must never block forever.
pub trait RiskAdvisor: Send + Sync {
    fn advise(&self, request: &AdvisoryRequest) -> Result<AdvisorOpinion, AdvisorError>;
}
