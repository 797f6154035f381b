//! Kinney scoring primitives shared by every workflow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest admissible factor rating.
pub const MIN_RATING: u8 = 1;
/// Highest admissible factor rating.
pub const MAX_RATING: u8 = 5;
/// Highest reachable Kinney score (5 x 5 x 5).
pub const MAX_SCORE: u16 = 125;

/// One of the three ordinal Kinney factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Severity,
    Frequency,
    Probability,
}

impl Factor {
    pub const ALL: [Factor; 3] = [Factor::Severity, Factor::Frequency, Factor::Probability];

    /// Single-letter tag used in traces and comparison views.
    pub fn symbol(&self) -> &'static str {
        match self {
            Factor::Severity => "G",
            Factor::Frequency => "F",
            Factor::Probability => "P",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Factor::Severity => "G (Severity)",
            Factor::Frequency => "F (Frequency)",
            Factor::Probability => "P (Probability)",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Three-way severity band derived from a Kinney score, never stored on its
/// own authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Classification {
    Low,
    Medium,
    High,
}

impl Classification {
    pub const ALL: [Classification; 3] =
        [Classification::Low, Classification::Medium, Classification::High];

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Low => "Low",
            Classification::Medium => "Medium",
            Classification::High => "High",
        }
    }

    /// Inclusive score bounds of the band.
    pub fn bounds(&self) -> (u16, u16) {
        match self {
            Classification::Low => (0, 25),
            Classification::Medium => (26, 50),
            Classification::High => (51, MAX_SCORE),
        }
    }

    /// Recommended action plan surfaced with every evaluation.
    pub fn action_plan(&self) -> &'static str {
        match self {
            Classification::Low => "Address through long-term measures",
            Classification::Medium => "Attention required, plan short and medium term measures",
            Classification::High => "Take immediate measures",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Forces a rating into the admissible `[1, 5]` range.
pub fn clamp_rating(value: u8) -> u8 {
    value.clamp(MIN_RATING, MAX_RATING)
}

/// Multiplicative Kinney score. Inputs are clamped so the result always lands
/// in `[1, 125]`.
pub fn score(severity: u8, frequency: u8, probability: u8) -> u16 {
    u16::from(clamp_rating(severity))
        * u16::from(clamp_rating(frequency))
        * u16::from(clamp_rating(probability))
}

/// Band thresholds: `<= 25` Low, `26..=50` Medium, above Medium High.
pub fn classify(score: u16) -> Classification {
    if score <= 25 {
        Classification::Low
    } else if score <= 50 {
        Classification::Medium
    } else {
        Classification::High
    }
}

/// Projects a raw score onto a 0-100 scale for display.
pub fn normalized_score(score: u16) -> u8 {
    (f64::from(score) / f64::from(MAX_SCORE) * 100.0).round() as u8
}
