//! Static question bank. Questions are defined at process start and never
//! mutated; answers reference them by question and option id.

use serde::{Deserialize, Serialize};

use crate::kinney::{Classification, Factor};

pub const QUESTIONNAIRE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
    /// Ordinal contribution on the 1-5 factor scale.
    pub contribution: u8,
    /// Qualitative band shown next to anchor options (1, 3, 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<Classification>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub factor: Factor,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
    /// Relative weight in the aggregation, at least 1.
    pub weight: u32,
    /// Sectors the question applies to; empty means every sector.
    #[serde(default)]
    pub sectors: Vec<String>,
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    pub fn applies_to(&self, sector: Option<&str>) -> bool {
        match sector {
            None => true,
            Some(sector) => {
                self.sectors.is_empty() || self.sectors.iter().any(|entry| entry == sector)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    version: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(version: impl Into<String>, questions: Vec<Question>) -> Self {
        Self { version: version.into(), questions }
    }

    /// The production bank: two questions per factor, five options each,
    /// uniform weight, applicable to every sector.
    pub fn standard() -> Self {
        let questions = vec![
            question(
                "G1",
                Factor::Severity,
                "What is the potential impact if the risk materializes?",
                [
                    ("Minor impact", Some(Classification::Low)),
                    ("Limited impact", None),
                    ("Moderate impact", Some(Classification::Medium)),
                    ("Major impact", None),
                    ("Critical impact", Some(Classification::High)),
                ],
            ),
            question(
                "G2",
                Factor::Severity,
                "How critical are the assets involved (safety, finances, reputation)?",
                [
                    ("Low criticality", None),
                    ("Slight criticality", None),
                    ("Medium criticality", None),
                    ("High criticality", None),
                    ("Very high criticality", None),
                ],
            ),
            question(
                "F1",
                Factor::Frequency,
                "How often does exposure to the risk occur?",
                [
                    ("Very rare", Some(Classification::Low)),
                    ("Occasional", None),
                    ("Regular", Some(Classification::Medium)),
                    ("Frequent", None),
                    ("Daily", Some(Classification::High)),
                ],
            ),
            question(
                "F2",
                Factor::Frequency,
                "How long does exposure to the risk last?",
                [
                    ("Very short", None),
                    ("Short", None),
                    ("Moderate", None),
                    ("Long", None),
                    ("Very long", None),
                ],
            ),
            question(
                "P1",
                Factor::Probability,
                "How likely is the event to occur?",
                [
                    ("Very unlikely", Some(Classification::Low)),
                    ("Unlikely", None),
                    ("Fairly likely", Some(Classification::Medium)),
                    ("Likely", None),
                    ("Very likely", Some(Classification::High)),
                ],
            ),
            question(
                "P2",
                Factor::Probability,
                "Are there known vulnerabilities that increase the likelihood?",
                [
                    ("No known vulnerabilities", None),
                    ("Few vulnerabilities", None),
                    ("Some vulnerabilities", None),
                    ("Several vulnerabilities", None),
                    ("Numerous vulnerabilities", None),
                ],
            ),
        ];
        Self::new(QUESTIONNAIRE_VERSION, questions)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == question_id)
    }

    /// Questions applicable to the given sector, in bank order.
    pub fn for_sector(&self, sector: Option<&str>) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|question| question.applies_to(sector))
            .collect()
    }
}

fn question(
    id: &str,
    factor: Factor,
    prompt: &str,
    labels: [(&str, Option<Classification>); 5],
) -> Question {
    let options = labels
        .into_iter()
        .enumerate()
        .map(|(index, (label, band))| QuestionOption {
            id: format!("{}_O{}", id, index + 1),
            label: label.to_string(),
            contribution: index as u8 + 1,
            band,
        })
        .collect();
    Question {
        id: id.to_string(),
        factor,
        prompt: prompt.to_string(),
        options,
        weight: 1,
        sectors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_bank_shape() {
        let bank = QuestionBank::standard();
        assert_eq!(bank.version(), QUESTIONNAIRE_VERSION);
        assert_eq!(bank.questions().len(), 6);
        for factor in Factor::ALL {
            let count = bank
                .questions()
                .iter()
                .filter(|question| question.factor == factor)
                .count();
            assert_eq!(count, 2, "two questions per factor");
        }
        for question in bank.questions() {
            assert_eq!(question.options.len(), 5);
            assert_eq!(question.weight, 1);
            assert!(question.sectors.is_empty());
            for (index, option) in question.options.iter().enumerate() {
                assert_eq!(option.contribution as usize, index + 1);
                assert_eq!(option.id, format!("{}_O{}", question.id, index + 1));
            }
        }
    }

    #[test]
    fn option_lookup() {
        let bank = QuestionBank::standard();
        let question = bank.question("P1").expect("P1 exists");
        assert_eq!(question.factor, Factor::Probability);
        let option = question.option("P1_O5").expect("option exists");
        assert_eq!(option.contribution, 5);
        assert_eq!(option.band, Some(Classification::High));
        assert!(question.option("P1_O9").is_none());
    }

    #[test]
    fn sector_filter_keeps_unrestricted_questions() {
        let bank = QuestionBank::standard();
        assert_eq!(bank.for_sector(Some("Agriculture")).len(), 6);
        assert_eq!(bank.for_sector(None).len(), 6);
    }

    #[test]
    fn sector_filter_honors_restrictions() {
        let mut questions = QuestionBank::standard().questions.clone();
        questions[0].sectors = vec!["Technology".to_string()];
        let bank = QuestionBank::new("test", questions);
        assert_eq!(bank.for_sector(Some("Technology")).len(), 6);
        assert_eq!(bank.for_sector(Some("Agriculture")).len(), 5);
        // no sector requested: restricted questions still listed
        assert_eq!(bank.for_sector(None).len(), 6);
    }
}
