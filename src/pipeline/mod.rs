pub mod compose;
pub mod confidence;
pub mod extraction;
pub mod normalize;
pub mod orchestrator;
pub mod terminology;
pub mod types;

pub use extraction::{extract_entities, EntitySet};
pub use normalize::normalize;
pub use orchestrator::{Simplifier, SimplifyOutcome};
pub use terminology::{DictionaryError, TerminologyDictionary};
pub use types::{InstructionStep, SimplificationResult};

use thiserror::Error;

/// Rejected input, reported before any processing happens.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("No text provided")]
    Empty,
}
