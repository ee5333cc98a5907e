//! Common regex patterns for bill field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Amount with exactly two fractional digits, optionally negative: 45.00, -3.10
    pub static ref PRICE_PATTERN: Regex = Regex::new(
        r"-?[0-9]+\.[0-9]{2}"
    ).unwrap();

    // Slash dates (12/28/15, 12/28/2023) or long form (December 28, 2023)
    pub static ref DATE_PATTERN: Regex = Regex::new(
        r"[0-9]{2}/[0-9]{2}/(?:[0-9]{4}|[0-9]{2})|\w{3,9}\s[0-9]{1,2},\s[0-9]{4}"
    ).unwrap();
}
