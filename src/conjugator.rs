use crate::models::Language;
use crate::storage::SinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConjugateError {
    #[error("Invalid template for '{word}': {template}")]
    InvalidTemplate { word: String, template: String },

    #[error("Template has no tense: {0}")]
    MissingTense(String),

    #[error("Unknown tense '{value}' in {template}")]
    InvalidTense { template: String, value: String },

    #[error("Template has no number: {0}")]
    MissingNumber(String),

    #[error("Unknown number '{value}' in {template}")]
    InvalidNumber { template: String, value: String },

    #[error("Unknown person '{value}' in {template}")]
    InvalidPerson { template: String, value: String },

    #[error("Mood '{mood}' is not conjugated: {template}")]
    UnsupportedMood { template: String, mood: String },

    #[error("Storage error: {0}")]
    Sink(#[from] SinkError),
}

impl ConjugateError {
    /// True for templates that are well formed but describe something this
    /// pipeline does not model, as opposed to broken markup or storage failures.
    pub fn is_skip(&self) -> bool {
        matches!(self, ConjugateError::UnsupportedMood { .. })
    }
}

/// Builds inflection tables for one language from its verb templates.
///
/// A conjugator is shared by every worker, so `conjugate` takes `&self` and
/// must be safe to call concurrently.
pub trait Conjugator: Send + Sync {
    fn language(&self) -> &Language;

    /// Stores what `template` says about `word` and returns how many verb
    /// forms were new to the sink. Templates that only introduce a section persist
    /// nothing and succeed.
    fn conjugate(&self, word: &str, template: &str) -> Result<usize, ConjugateError>;
}
