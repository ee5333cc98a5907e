//! Data models and configuration.

pub mod config;
pub mod fields;
pub mod result;

pub use config::BillexConfig;
pub use fields::{FieldGuess, FieldGuesses, FieldValue};
pub use result::{Extraction, ExtractionResult, KeyedResult};
