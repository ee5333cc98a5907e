//! Structured extraction results.

use std::collections::BTreeSet;

use serde::Serialize;

use super::fields::FieldGuess;

/// Result of pattern classification over raw text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// Every price match in order of appearance, duplicates kept.
    pub prices: Vec<f64>,
    /// Distinct date matches in their original surface form.
    pub dates: BTreeSet<String>,
    /// Distinct digit-bearing tokens that are neither prices nor dates.
    pub others: BTreeSet<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty() && self.dates.is_empty() && self.others.is_empty()
    }
}

/// Result of normalizing model field guesses.
///
/// Each bucket keeps one `(key, value)` pair per classified field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyedResult {
    pub prices: Vec<FieldGuess>,
    pub dates: Vec<FieldGuess>,
    pub others: Vec<FieldGuess>,
}

impl KeyedResult {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty() && self.dates.is_empty() && self.others.is_empty()
    }
}

/// Output of one run, tagged by the mode that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Extraction {
    Pattern(ExtractionResult),
    Model(KeyedResult),
}
