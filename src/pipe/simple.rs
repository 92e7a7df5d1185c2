use std::fmt;
use std::sync::Arc;

use async_openai::types::CreateChatCompletionResponse;
use async_trait::async_trait;
use serde_json::json;

use crate::context::PageContext;
use crate::error::ListingError;
use crate::llm::{CompletionService, PromptVariables};
use crate::logging::ListingLogger;
use crate::parsing::{ACTION_LISTING_TAG, ListingParser, StructuredContent};
use crate::types::{Action, PossibleAction};

use super::listing::{ActionListingPipe, PromptIds};

/// Hook supplying the prompt variables of a prompt-driven pipe.
pub trait PromptVariableBuilder: Send + Sync {
    fn build_variables(&self, context: &PageContext, previous: Option<&[Action]>)
    -> PromptVariables;
}

/// Prompt-driven pipe: build variables, issue one completion, extract the
/// tagged listing, and parse it.
///
/// There is no retry at this layer; wrap it in a
/// [`RetryPipeWrapper`](super::RetryPipeWrapper) for that.
pub struct SimpleActionListingPipe {
    service: Arc<dyn CompletionService>,
    variables: Box<dyn PromptVariableBuilder>,
    parser: Box<dyn ListingParser>,
    prompt_id: String,
    incremental_prompt_id: String,
    extractor: StructuredContent,
    logger: Arc<ListingLogger>,
}

impl fmt::Debug for SimpleActionListingPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleActionListingPipe")
            .field("prompt_id", &self.prompt_id)
            .field("incremental_prompt_id", &self.incremental_prompt_id)
            .field("outer_tag", &self.extractor.outer_tag())
            .finish()
    }
}

impl SimpleActionListingPipe {
    pub fn new(
        service: Arc<dyn CompletionService>,
        variables: Box<dyn PromptVariableBuilder>,
        parser: Box<dyn ListingParser>,
        prompt_id: impl Into<String>,
        incremental_prompt_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            variables,
            parser,
            prompt_id: prompt_id.into(),
            incremental_prompt_id: incremental_prompt_id.into(),
            extractor: StructuredContent::new(ACTION_LISTING_TAG),
            logger: Arc::new(ListingLogger::default()),
        }
    }

    pub fn with_logger(mut self, logger: Arc<ListingLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn prompt_id(&self) -> &str {
        &self.prompt_id
    }

    pub fn incremental_prompt_id(&self) -> &str {
        &self.incremental_prompt_id
    }

    pub fn build_variables(
        &self,
        context: &PageContext,
        previous: Option<&[Action]>,
    ) -> PromptVariables {
        self.variables.build_variables(context, previous)
    }

    /// Extract the `<action-listing>` payload of the first choice and parse it.
    pub fn parse_reply(
        &self,
        response: &CreateChatCompletionResponse,
    ) -> Result<Vec<PossibleAction>, ListingError> {
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or(ListingError::EmptyReply)?;

        self.logger.debug(
            "LLM action listing response",
            Some("listing"),
            Some(json!({ "content": content })),
        );

        let text = self.extractor.extract(content)?;
        Ok(self.parser.parse(&text)?)
    }

    async fn complete(
        &self,
        prompt_id: &str,
        variables: &PromptVariables,
    ) -> Result<Vec<PossibleAction>, ListingError> {
        let response = self.service.completion(prompt_id, variables).await?;
        self.parse_reply(&response)
    }
}

#[async_trait]
impl ActionListingPipe for SimpleActionListingPipe {
    async fn list(
        &self,
        context: &PageContext,
        previous: Option<&[Action]>,
    ) -> Result<Vec<PossibleAction>, ListingError> {
        let variables = self.build_variables(context, previous);
        self.complete(&self.prompt_id, &variables).await
    }

    async fn list_incremental(
        &self,
        context: &PageContext,
        previous: &[Action],
    ) -> Result<Vec<PossibleAction>, ListingError> {
        let incremental_context = context.subgraph_without(previous);
        let variables = self.build_variables(&incremental_context, Some(previous));
        self.complete(&self.incremental_prompt_id, &variables).await
    }

    fn prompt_ids(&self) -> Option<PromptIds<'_>> {
        Some(PromptIds {
            fresh: &self.prompt_id,
            incremental: &self.incremental_prompt_id,
        })
    }
}
