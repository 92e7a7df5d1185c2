use std::sync::Arc;

use crate::context::PageContext;
use crate::error::ListingError;
use crate::llm::{
    ACTION_LISTING_INCREMENTAL_PROMPT_ID, ACTION_LISTING_PROMPT_ID, CompletionService,
    PromptVariables,
};
use crate::parsing::ActionListingParser;
use crate::types::{Action, ActionFilter, ActionSpace};

use super::default_completion_service;
use super::simple::{PromptVariableBuilder, SimpleActionListingPipe};

pub const DOCUMENT_VARIABLE: &str = "document";
pub const PREVIOUS_ACTION_LIST_VARIABLE: &str = "previous_action_list";

/// Variables of the markdown-table prompts: the page document, plus the
/// previously known actions rendered as markdown without special actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownTableVariables;

impl PromptVariableBuilder for MarkdownTableVariables {
    fn build_variables(
        &self,
        context: &PageContext,
        previous: Option<&[Action]>,
    ) -> PromptVariables {
        let mut variables = PromptVariables::new();
        variables.insert(DOCUMENT_VARIABLE.to_string(), context.markdown_description());
        if let Some(previous) = previous {
            variables.insert(
                PREVIOUS_ACTION_LIST_VARIABLE.to_string(),
                ActionSpace::from(previous).markdown(ActionFilter::All, false),
            );
        }
        variables
    }
}

impl SimpleActionListingPipe {
    /// Markdown-table strategy: table parser, `action-listing/optim` for fresh
    /// listings and `action-listing-incr` for incremental ones.
    ///
    /// Without `service` the default model service is built from the
    /// environment; failures there are returned immediately.
    pub fn markdown_table(
        service: Option<Arc<dyn CompletionService>>,
    ) -> Result<Self, ListingError> {
        let service = match service {
            Some(service) => service,
            None => default_completion_service()?,
        };
        Ok(Self::new(
            service,
            Box::new(MarkdownTableVariables),
            Box::new(ActionListingParser::Table),
            ACTION_LISTING_PROMPT_ID,
            ACTION_LISTING_INCREMENTAL_PROMPT_ID,
        ))
    }
}
