use async_trait::async_trait;

use async_openai::error::OpenAIError;
use async_openai::types::{CreateChatCompletionRequest, CreateChatCompletionResponse};

use super::error::LlmError;
use super::prompts::PromptVariables;

/// Raw chat completion transport, e.g. an OpenAI-compatible HTTP API.
#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    async fn create_chat_completion(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, OpenAIError>;
}

/// Prompt-level completion boundary used by the listing pipes.
///
/// Implementations resolve `prompt_id` to a template, fill it with `variables`,
/// and return the model reply untouched. Tests inject stubs here.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn completion(
        &self,
        prompt_id: &str,
        variables: &PromptVariables,
    ) -> Result<CreateChatCompletionResponse, LlmError>;
}
