//! Model service used by the listing pipes.
//!
//! [`CompletionService`] is the prompt-level boundary the pipes call; the
//! default implementation, [`LlmService`], renders built-in prompt templates and
//! sends them through an OpenAI-compatible [`ChatCompletionProvider`] powered by
//! the `async-openai` crate.

pub mod error;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod service;

pub use error::LlmError;
pub use openai::OpenAiChatProvider;
pub use prompts::{
    ACTION_LISTING_INCREMENTAL_PROMPT_ID, ACTION_LISTING_PROMPT_ID, PromptLibrary, PromptTemplate,
    PromptVariables, RenderedPrompt,
};
pub use provider::{ChatCompletionProvider, CompletionService};
pub use service::{CompletionOptions, LlmService, MetricsCallback};
