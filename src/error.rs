use thiserror::Error;

use crate::config::ListingConfigError;
use crate::llm::LlmError;
use crate::parsing::{ExtractionError, ParseError};

/// Errors surfaced by the listing pipes and the strategy registry.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("model reply carried no text content")]
    EmptyReply,
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Config(#[from] ListingConfigError),
    #[error("unknown action listing strategy: {0}")]
    UnknownStrategy(String),
    #[error("failed to get action list after {} tries with errors: {}", .errors.len(), format_errors(.errors))]
    RetriesExhausted { errors: Vec<String> },
}

impl ListingError {
    /// Per-attempt messages carried by a [`ListingError::RetriesExhausted`].
    pub fn attempt_errors(&self) -> &[String] {
        match self {
            ListingError::RetriesExhausted { errors } => errors,
            _ => &[],
        }
    }
}

fn format_errors(errors: &[String]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(index, error)| format!("[{}] {error}", index + 1))
        .collect::<Vec<_>>()
        .join("; ")
}
