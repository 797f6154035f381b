//! Synthetic training rows drawn from per-type bias profiles. The real
//! questionnaire corpus grows slowly, so retraining pads it with plausible
//! rows whose factor tendencies follow the risk type and category.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::domain::TrainingRow;
use crate::catalog::{RISK_CATEGORIES, RISK_TYPES};

/// Probability of drawing a high rating (4 or 5) per factor, before the
/// category modifier is applied.
struct TypeBias {
    risk_type: &'static str,
    severity: f64,
    frequency: f64,
    probability: f64,
}

const TYPE_BIASES: [TypeBias; 4] = [
    TypeBias { risk_type: "Commercial", severity: 0.4, frequency: 0.5, probability: 0.4 },
    TypeBias { risk_type: "Financial", severity: 0.6, frequency: 0.3, probability: 0.5 },
    TypeBias { risk_type: "Technical", severity: 0.5, frequency: 0.6, probability: 0.4 },
    TypeBias { risk_type: "Cyber & InfoSec", severity: 0.7, frequency: 0.5, probability: 0.6 },
];

struct CategoryModifier {
    category: &'static str,
    severity: f64,
    frequency: f64,
    probability: f64,
}

const CATEGORY_MODIFIERS: [CategoryModifier; 3] = [
    CategoryModifier { category: "Program", severity: 0.0, frequency: 0.1, probability: 0.0 },
    CategoryModifier { category: "Industrial", severity: 0.2, frequency: 0.1, probability: 0.1 },
    CategoryModifier { category: "Quality", severity: -0.1, frequency: 0.2, probability: 0.0 },
];

/// Deterministic generator; the same seed reproduces the same rows.
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn generate(&mut self, count: usize) -> Vec<TrainingRow> {
        (0..count).map(|_| self.row()).collect()
    }

    fn row(&mut self) -> TrainingRow {
        let category = RISK_CATEGORIES[self.rng.gen_range(0..RISK_CATEGORIES.len())];
        let risk_type = RISK_TYPES[self.rng.gen_range(0..RISK_TYPES.len())];

        let bias = TYPE_BIASES
            .iter()
            .find(|entry| entry.risk_type == risk_type)
            .unwrap_or(&TYPE_BIASES[0]);
        let modifier = CATEGORY_MODIFIERS
            .iter()
            .find(|entry| entry.category == category)
            .unwrap_or(&CATEGORY_MODIFIERS[0]);

        let severity = self.biased_rating(bias.severity + modifier.severity);
        let frequency = self.biased_rating(bias.frequency + modifier.frequency);
        let probability = self.biased_rating(bias.probability + modifier.probability);

        TrainingRow::from_ratings(severity, frequency, probability, category, risk_type)
    }

    /// Draws a rating: with probability `high_chance` (clamped to [0.1, 0.9])
    /// the rating comes from the high pool {4: 60%, 5: 40%}, otherwise from
    /// the low pool {1: 30%, 2: 40%, 3: 30%}.
    fn biased_rating(&mut self, high_chance: f64) -> u8 {
        let chance = high_chance.clamp(0.1, 0.9);
        if self.rng.gen::<f64>() < chance {
            if self.rng.gen::<f64>() < 0.6 {
                4
            } else {
                5
            }
        } else {
            match self.rng.gen::<f64>() {
                draw if draw < 0.3 => 1,
                draw if draw < 0.7 => 2,
                _ => 3,
            }
        }
    }
}
