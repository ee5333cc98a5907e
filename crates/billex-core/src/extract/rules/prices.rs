//! Price extraction.

use tracing::trace;

use super::patterns::PRICE_PATTERN;
use super::{ExtractionMatch, FieldExtractor};

/// Extracts two-decimal amounts such as `45.00` or `-12.50`.
#[derive(Debug, Clone, Copy)]
pub struct PriceExtractor;

impl PriceExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Whether the text holds at least one price.
    pub fn matches(&self, text: &str) -> bool {
        PRICE_PATTERN.is_match(text)
    }
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PriceExtractor {
    type Output = ExtractionMatch<f64>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for m in PRICE_PATTERN.find_iter(text) {
            match m.as_str().parse::<f64>() {
                Ok(amount) => results.push(
                    ExtractionMatch::new(amount, m.as_str()).with_position(m.start(), m.end()),
                ),
                Err(e) => trace!("Skipping unparsable amount {:?}: {}", m.as_str(), e),
            }
        }

        results
    }
}
