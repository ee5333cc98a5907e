//! Date extraction.

use super::patterns::DATE_PATTERN;
use super::{ExtractionMatch, FieldExtractor};

/// Extracts slash dates and long-form dates, keeping their surface form.
///
/// Dates are not validated against the calendar: `99/99/99` is a match.
#[derive(Debug, Clone, Copy)]
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Whether the text holds at least one date.
    pub fn matches(&self, text: &str) -> bool {
        DATE_PATTERN.is_match(text)
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        DATE_PATTERN.find(text).map(|m| {
            ExtractionMatch::new(m.as_str().to_string(), m.as_str())
                .with_position(m.start(), m.end())
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DATE_PATTERN
            .find_iter(text)
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), m.as_str())
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}
