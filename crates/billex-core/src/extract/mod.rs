//! Field extraction: pattern classification and model-assisted structuring.

mod classifier;
mod filter;
mod normalizer;
mod response;
pub mod rules;
mod structurer;

pub use classifier::PatternClassifier;
pub use filter::LineFilter;
pub use normalizer::ModelResultNormalizer;
pub use response::parse_response;
pub use structurer::{build_prompt, ChatLineStructurer, LineStructurer};
