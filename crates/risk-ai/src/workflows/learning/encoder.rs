//! Categorical label encoding. Encoders are rebuilt from scratch on every
//! training run and versioned inside the artifact, so the model and its
//! vocabulary can never drift apart.

use serde::{Deserialize, Serialize};

/// Sentinel index substituted when a value was never seen during fitting.
pub const UNSEEN_INDEX: usize = 0;

/// Maps string values onto dense indices over the sorted distinct values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fits over the distinct values, sorted so the index assignment is
    /// independent of input order.
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = values.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes.binary_search_by(|class| class.as_str().cmp(value)).ok()
    }

    /// Transform with the unseen-value sentinel applied.
    pub fn transform_or_unseen(&self, value: &str) -> usize {
        self.transform(value).unwrap_or(UNSEEN_INDEX)
    }

    pub fn inverse(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }
}
