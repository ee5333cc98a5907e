//! Pattern classification of raw bill text into prices, dates and others.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::result::ExtractionResult;

use super::rules::{DateExtractor, FieldExtractor, PriceExtractor};

/// Splits a text blob into price, date and leftover numeric tokens.
///
/// Token removal compares whole whitespace-separated tokens against the
/// matched price and date text. A match glued to punctuation, such as
/// `$12.50,` or `(12/28/2023)`, is not removed and may surface in
/// `others` when it carries no currency marker. A token carries a digit
/// when any of its characters is numeric in Unicode, not only `0-9`.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    currency_markers: Vec<char>,
}

impl PatternClassifier {
    /// Create a classifier with the default currency markers.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            currency_markers: config.currency_markers.chars().collect(),
        }
    }

    /// Set the characters that mark a token as a currency amount.
    pub fn with_currency_markers(mut self, markers: &str) -> Self {
        self.currency_markers = markers.chars().collect();
        self
    }

    /// Classify a text blob.
    pub fn parse(&self, text: &str) -> ExtractionResult {
        let price_matches = PriceExtractor::new().extract_all(text);
        let dates: BTreeSet<String> = DateExtractor::new()
            .extract_all(text)
            .into_iter()
            .map(|m| m.value)
            .collect();

        let price_tokens: HashSet<&str> = price_matches.iter().map(|m| m.source.as_str()).collect();

        let others: BTreeSet<String> = text
            .split_whitespace()
            .filter(|token| !dates.contains(*token) && !price_tokens.contains(token))
            .filter(|token| has_digit(token) && !self.has_currency_marker(token))
            .map(str::to_string)
            .collect();

        let prices: Vec<f64> = price_matches.into_iter().map(|m| m.value).collect();

        debug!(
            "Pattern classification: {} prices, {} dates, {} others",
            prices.len(),
            dates.len(),
            others.len()
        );

        ExtractionResult {
            prices,
            dates,
            others,
        }
    }

    fn has_currency_marker(&self, token: &str) -> bool {
        token.chars().any(|c| self.currency_markers.contains(&c))
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Any Unicode numeric character counts, so `٤٥٦` is a digit token.
fn has_digit(token: &str) -> bool {
    token.chars().any(char::is_numeric)
}
