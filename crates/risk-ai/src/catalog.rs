//! Fixed business catalogs: categories, types, sectors and the descriptive
//! rating scale surfaced to clients.

use crate::kinney::Factor;

pub const RISK_CATEGORIES: [&str; 3] = ["Program", "Industrial", "Quality"];

pub const RISK_TYPES: [&str; 4] = ["Commercial", "Financial", "Technical", "Cyber & InfoSec"];

pub const SECTORS: [&str; 8] = [
    "Mobility & Transport",
    "Agriculture",
    "Technology",
    "Innovation",
    "Startup",
    "Very Small Business",
    "Small & Medium Business",
    "Mid-size Enterprise",
];

pub fn validate_category(category: &str) -> bool {
    RISK_CATEGORIES.contains(&category)
}

pub fn validate_risk_type(risk_type: &str) -> bool {
    RISK_TYPES.contains(&risk_type)
}

/// Human wording for one rating step of a factor. Out-of-range ratings fall
/// back to the closest step, mirroring `clamp_rating`.
pub fn rating_description(factor: Factor, rating: u8) -> &'static str {
    let step = rating.clamp(1, 5) as usize - 1;
    match factor {
        Factor::Severity => SEVERITY_SCALE[step],
        Factor::Frequency => FREQUENCY_SCALE[step],
        Factor::Probability => PROBABILITY_SCALE[step],
    }
}

const SEVERITY_SCALE: [&str; 5] =
    ["Negligible", "Minor", "Moderate", "Serious", "Catastrophic"];

const FREQUENCY_SCALE: [&str; 5] =
    ["Rare", "Occasional", "Frequent", "Very frequent", "Permanent"];

const PROBABILITY_SCALE: [&str; 5] =
    ["Improbable", "Unlikely", "Likely", "Very likely", "Almost certain"];
