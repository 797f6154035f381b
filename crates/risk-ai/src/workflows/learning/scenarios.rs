//! Curated risk scenarios seeding every training run.

use serde::{Deserialize, Serialize};

use crate::kinney::{self, Classification};

use super::domain::TrainingRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub description: String,
    pub category: String,
    pub risk_type: String,
    pub severity: u8,
    pub frequency: u8,
    pub probability: u8,
}

impl Scenario {
    pub fn score(&self) -> u16 {
        kinney::score(self.severity, self.frequency, self.probability)
    }

    pub fn classification(&self) -> Classification {
        kinney::classify(self.score())
    }

    pub fn training_row(&self) -> TrainingRow {
        TrainingRow::from_ratings(
            self.severity,
            self.frequency,
            self.probability,
            self.category.clone(),
            self.risk_type.clone(),
        )
    }
}

/// Four hand-picked scenarios per risk type, scored like any other risk.
pub fn standard_scenarios() -> Vec<Scenario> {
    let rows: [(&str, &str, &str, u8, u8, u8); 16] = [
        ("Loss of a major customer", "Program", "Commercial", 3, 4, 3),
        ("Failed contract negotiation", "Program", "Commercial", 4, 3, 4),
        ("Recurring customer complaints", "Quality", "Commercial", 2, 5, 2),
        ("Breakdown of a strategic partnership", "Industrial", "Commercial", 5, 2, 3),
        ("Major budget overrun", "Program", "Financial", 5, 2, 4),
        ("Raw material cost fluctuations", "Industrial", "Financial", 4, 4, 3),
        ("Late delivery penalties", "Quality", "Financial", 3, 3, 4),
        ("Bankruptcy of a key supplier", "Program", "Financial", 5, 1, 5),
        ("Critical equipment failure", "Industrial", "Technical", 4, 4, 3),
        ("Product non-conformity", "Quality", "Technical", 3, 5, 4),
        ("Technology obsolescence", "Program", "Technical", 5, 3, 4),
        ("Production system failure", "Industrial", "Technical", 4, 3, 3),
        ("Ransomware attack", "Program", "Cyber & InfoSec", 5, 4, 4),
        ("Sensitive data leak", "Industrial", "Cyber & InfoSec", 5, 3, 5),
        ("Targeted phishing campaign", "Quality", "Cyber & InfoSec", 4, 5, 3),
        ("Critical infrastructure compromise", "Industrial", "Cyber & InfoSec", 5, 2, 4),
    ];

    rows.into_iter()
        .map(|(description, category, risk_type, severity, frequency, probability)| Scenario {
            description: description.to_string(),
            category: category.to_string(),
            risk_type: risk_type.to_string(),
            severity,
            frequency,
            probability,
        })
        .collect()
}
