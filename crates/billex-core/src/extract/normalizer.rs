//! Redistribution of model field guesses into price, date and other buckets.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::models::fields::{FieldGuess, FieldGuesses, FieldValue};
use crate::models::result::KeyedResult;

use super::rules::{DateExtractor, FieldExtractor};

/// Reclassifies typed field guesses with the same rules as the pattern path.
///
/// - numbers with at most two fractional digits are prices
/// - text holding `/` or `,` and a date match is a date (matched part only)
/// - any other text is an other
///
/// Numbers with more precision are dropped.
#[derive(Debug, Clone, Default)]
pub struct ModelResultNormalizer {
    dates: DateExtractor,
}

impl ModelResultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize merged guesses, preserving input order within each bucket.
    pub fn normalize(&self, guesses: &FieldGuesses) -> KeyedResult {
        let mut result = KeyedResult::default();
        let mut classified: HashSet<&str> = HashSet::new();

        for guess in guesses.iter() {
            if let Some(number) = guess.value.as_number() {
                if is_price(number) {
                    result.prices.push(guess.clone());
                    classified.insert(guess.key.as_str());
                } else {
                    trace!("Dropping {} = {}: more than two decimals", guess.key, number);
                }
            }

            if let Some(date) = guess.value.as_text().and_then(|text| self.match_date(text)) {
                result
                    .dates
                    .push(FieldGuess::new(guess.key.clone(), FieldValue::Text(date)));
                classified.insert(guess.key.as_str());
            }
        }

        for guess in guesses.iter() {
            if guess.value.as_text().is_some() && !classified.contains(guess.key.as_str()) {
                result.others.push(guess.clone());
            }
        }

        debug!(
            "Normalized {} guesses: {} prices, {} dates, {} others",
            guesses.len(),
            result.prices.len(),
            result.dates.len(),
            result.others.len()
        );

        result
    }

    fn match_date(&self, text: &str) -> Option<String> {
        if !text.contains(['/', ',']) {
            return None;
        }
        self.dates.extract(text).map(|m| m.value)
    }
}

/// Whether a number survives rounding to two decimals unchanged.
fn is_price(value: f64) -> bool {
    value.is_finite() && (value * 100.0).round() / 100.0 == value
}
