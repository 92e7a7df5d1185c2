use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_trait::async_trait;
use serde_json::json;

use crate::config::ListingConfig;
use crate::logging::ListingLogger;

use super::error::LlmError;
use super::openai::OpenAiChatProvider;
use super::prompts::{PromptLibrary, PromptVariables};
use super::provider::{ChatCompletionProvider, CompletionService};

/// Callback invoked after a successful completion with the reply, its latency,
/// and the prompt id that produced it.
pub type MetricsCallback =
    Arc<dyn Fn(&CreateChatCompletionResponse, Duration, &str) + Send + Sync + 'static>;

/// Sampling options applied to every request issued by an [`LlmService`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_completion_tokens: Option<u32>,
    pub seed: Option<i64>,
}

/// Model service resolving prompt ids to chat completions.
pub struct LlmService<P: ChatCompletionProvider> {
    provider: P,
    default_model: String,
    options: CompletionOptions,
    prompts: PromptLibrary,
    logger: Arc<ListingLogger>,
    metrics_callback: Option<MetricsCallback>,
}

impl<P> fmt::Debug for LlmService<P>
where
    P: ChatCompletionProvider + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmService")
            .field("provider", &self.provider)
            .field("default_model", &self.default_model)
            .field("options", &self.options)
            .field("logger", &self.logger)
            .field("metrics_callback", &self.metrics_callback.is_some())
            .finish()
    }
}

impl<P: ChatCompletionProvider> LlmService<P> {
    /// Create a service with the supplied provider, default model, and built-in prompts.
    pub fn new(default_model: impl Into<String>, provider: P) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
            options: CompletionOptions::default(),
            prompts: PromptLibrary::default(),
            logger: Arc::new(ListingLogger::default()),
            metrics_callback: None,
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_logger(mut self, logger: Arc<ListingLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Attach a metrics callback invoked after successful completions.
    pub fn with_metrics_callback(mut self, callback: Option<MetricsCallback>) -> Self {
        self.metrics_callback = callback;
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Access the underlying provider (primarily for testing).
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Render `prompt_id` with `variables` into a chat completion request.
    pub fn build_request(
        &self,
        prompt_id: &str,
        variables: &PromptVariables,
    ) -> Result<CreateChatCompletionRequest, LlmError> {
        if self.default_model.trim().is_empty() {
            return Err(LlmError::MissingDefaultModel);
        }

        let rendered = self.prompts.render(prompt_id, variables)?;

        let system = ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(ChatCompletionRequestSystemMessageContent::Text(
                    rendered.system,
                ))
                .build()
                .map_err(|err| LlmError::InvalidRequest(err.to_string()))?,
        );
        let user = ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Text(rendered.user))
                .build()
                .map_err(|err| LlmError::InvalidRequest(err.to_string()))?,
        );

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(self.default_model.clone());
        builder.messages(vec![system, user]);
        apply_options(&mut builder, &self.options);

        builder
            .build()
            .map_err(|err| LlmError::InvalidRequest(err.to_string()))
    }

    async fn execute_request(
        &self,
        request: CreateChatCompletionRequest,
        prompt_id: &str,
    ) -> Result<CreateChatCompletionResponse, LlmError> {
        let model = request.model.clone();
        self.logger.debug(
            "Sending chat completion request",
            Some("llm"),
            Some(json!({ "model": model, "prompt_id": prompt_id })),
        );

        let start = Instant::now();
        match self.provider.create_chat_completion(request).await {
            Ok(response) => {
                let elapsed = start.elapsed();
                if let Some(callback) = &self.metrics_callback {
                    callback(&response, elapsed, prompt_id);
                }
                self.logger.debug(
                    "Chat completion succeeded",
                    Some("llm"),
                    Some(json!({
                        "model": model,
                        "prompt_id": prompt_id,
                        "duration_ms": elapsed.as_millis() as u64,
                    })),
                );
                Ok(response)
            }
            Err(err) => {
                self.logger.error(
                    format!("Chat completion failed for model={model}: {err}"),
                    Some("llm"),
                    Some(json!({ "prompt_id": prompt_id })),
                );
                Err(LlmError::OpenAi(err))
            }
        }
    }
}

impl LlmService<OpenAiChatProvider> {
    /// Wire the OpenAI provider, model, sampling options, and logger from `config`.
    pub fn from_config(
        config: &ListingConfig,
        metrics_callback: Option<MetricsCallback>,
    ) -> Result<Self, LlmError> {
        let provider = OpenAiChatProvider::from_config(config)?;
        Ok(LlmService::new(config.model_name.as_str(), provider)
            .with_options(CompletionOptions {
                temperature: config.temperature,
                max_completion_tokens: config.max_tokens,
                seed: None,
            })
            .with_logger(Arc::new(ListingLogger::from_listing_config(config)))
            .with_metrics_callback(metrics_callback))
    }
}

#[async_trait]
impl<P: ChatCompletionProvider> CompletionService for LlmService<P> {
    async fn completion(
        &self,
        prompt_id: &str,
        variables: &PromptVariables,
    ) -> Result<CreateChatCompletionResponse, LlmError> {
        let request = self.build_request(prompt_id, variables)?;
        self.execute_request(request, prompt_id).await
    }
}

fn apply_options(builder: &mut CreateChatCompletionRequestArgs, options: &CompletionOptions) {
    if let Some(temperature) = options.temperature {
        builder.temperature(temperature);
    }
    if let Some(max_completion_tokens) = options.max_completion_tokens {
        builder.max_completion_tokens(max_completion_tokens);
    }
    if let Some(seed) = options.seed {
        builder.seed(seed);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_openai::error::{ApiError, OpenAIError};
    use async_openai::types::ChatCompletionRequestUserMessage;

    use crate::llm::prompts::{ACTION_LISTING_INCREMENTAL_PROMPT_ID, ACTION_LISTING_PROMPT_ID};

    /// Chat completion reply whose first choice carries `content`.
    pub(crate) fn completion_response(content: Option<&str>) -> CreateChatCompletionResponse {
        serde_json::from_value(json!({
            "id": "cmpl-test",
            "object": "chat.completion",
            "created": 0,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "finish_reason": "stop",
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "logprobs": null
            }],
            "usage": {
                "prompt_tokens": 120,
                "completion_tokens": 30,
                "total_tokens": 150
            },
            "system_fingerprint": null
        }))
        .unwrap()
    }

    #[derive(Debug, Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<CreateChatCompletionRequest>>,
        response: Mutex<Option<Result<CreateChatCompletionResponse, OpenAIError>>>,
    }

    impl RecordingProvider {
        fn with_response(response: CreateChatCompletionResponse) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Mutex::new(Some(Ok(response))),
            }
        }

        fn with_error(error: OpenAIError) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Mutex::new(Some(Err(error))),
            }
        }
    }

    #[async_trait]
    impl ChatCompletionProvider for RecordingProvider {
        async fn create_chat_completion(
            &self,
            request: CreateChatCompletionRequest,
        ) -> Result<CreateChatCompletionResponse, OpenAIError> {
            self.requests.lock().unwrap().push(request);
            self.response.lock().unwrap().take().unwrap_or_else(|| {
                Err(OpenAIError::ApiError(ApiError {
                    message: "no response configured".into(),
                    r#type: None,
                    param: None,
                    code: None,
                }))
            })
        }
    }

    fn document_vars() -> PromptVariables {
        PromptVariables::from([("document".to_string(), "- [B1] button \"Go\"".to_string())])
    }

    fn user_text(request: &CreateChatCompletionRequest) -> String {
        match &request.messages[1] {
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(text),
                ..
            }) => text.clone(),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn build_request_renders_prompt_and_options() {
        let service = LlmService::new("gpt-4o", RecordingProvider::default()).with_options(
            CompletionOptions {
                temperature: Some(0.0),
                max_completion_tokens: Some(512),
                seed: Some(7),
            },
        );

        let request = service
            .build_request(ACTION_LISTING_PROMPT_ID, &document_vars())
            .expect("build request");

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.messages.len(), 2);
        assert!(user_text(&request).contains("- [B1] button \"Go\""));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_completion_tokens, Some(512));
        assert_eq!(request.seed, Some(7));
    }

    #[test]
    fn blank_model_is_rejected() {
        let service = LlmService::new("  ", RecordingProvider::default());
        let err = service
            .build_request(ACTION_LISTING_PROMPT_ID, &document_vars())
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingDefaultModel));
    }

    #[tokio::test]
    async fn completion_reports_metrics_with_prompt_id() {
        let provider = RecordingProvider::with_response(completion_response(Some("hi")));
        let calls: Arc<Mutex<Vec<(String, Duration)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let service = LlmService::new("gpt-4o", provider).with_metrics_callback(Some(Arc::new(
            move |_, duration, prompt_id| {
                sink.lock().unwrap().push((prompt_id.to_string(), duration));
            },
        )));

        let response = service
            .completion(ACTION_LISTING_PROMPT_ID, &document_vars())
            .await
            .expect("completion succeeds");

        assert_eq!(response.choices[0].message.content.as_deref(), Some("hi"));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, ACTION_LISTING_PROMPT_ID);
    }

    #[tokio::test]
    async fn missing_variable_fails_before_calling_provider() {
        let service = LlmService::new("gpt-4o", RecordingProvider::default());

        let err = service
            .completion(ACTION_LISTING_INCREMENTAL_PROMPT_ID, &document_vars())
            .await
            .expect_err("previous_action_list is required");

        assert!(matches!(err, LlmError::MissingVariable { .. }));
        assert!(service.provider().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn propagates_provider_error() {
        let provider = RecordingProvider::with_error(OpenAIError::ApiError(ApiError {
            message: "bad request".to_string(),
            r#type: None,
            param: None,
            code: None,
        }));
        let service = LlmService::new("gpt-4o", provider);

        let err = service
            .completion(ACTION_LISTING_PROMPT_ID, &document_vars())
            .await
            .expect_err("should propagate error");

        match err {
            LlmError::OpenAi(OpenAIError::ApiError(api_err)) => {
                assert_eq!(api_err.message, "bad request");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
