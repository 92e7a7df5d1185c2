use thiserror::Error;

use async_openai::error::OpenAIError;

/// Errors surfaced by the model service layer.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing OpenAI API key; set MODEL_API_KEY or OPENAI_API_KEY")]
    MissingApiKey,
    #[error("missing default model configuration")]
    MissingDefaultModel,
    #[error("unknown prompt id: {0}")]
    UnknownPrompt(String),
    #[error("prompt {prompt_id} references variable '{variable}' which was not supplied")]
    MissingVariable { prompt_id: String, variable: String },
    #[error("invalid chat completion request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    OpenAi(#[from] OpenAIError),
}
