//! Selection of OCR lines worth sending to the line structurer.

use crate::models::config::ExtractionConfig;

use super::rules::{DateExtractor, PriceExtractor};

/// Decides whether a line likely carries an extractable field.
///
/// A line qualifies when it holds a price, a date, or at least
/// `min_digits` numeric characters (phone numbers, account numbers, long codes).
#[derive(Debug, Clone)]
pub struct LineFilter {
    min_digits: usize,
}

impl LineFilter {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_digits: config.min_digits,
        }
    }

    /// Set the digit count that qualifies a line on its own.
    pub fn with_min_digits(mut self, min_digits: usize) -> Self {
        self.min_digits = min_digits;
        self
    }

    pub fn qualifies(&self, line: &str) -> bool {
        PriceExtractor::new().matches(line)
            || DateExtractor::new().matches(line)
            || digit_count(line) >= self.min_digits
    }

    /// Keep qualifying lines in their original order.
    pub fn select<'a, I>(&self, lines: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines.into_iter().filter(|line| self.qualifies(line)).collect()
    }
}

impl Default for LineFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn digit_count(line: &str) -> usize {
    line.chars().filter(|c| c.is_numeric()).count()
}
