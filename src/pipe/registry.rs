use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ListingError;
use crate::llm::{
    ACTION_LISTING_INCREMENTAL_PROMPT_ID, ACTION_LISTING_PROMPT_ID, CompletionService,
};
use crate::logging::ListingLogger;

use super::listing::{ActionListingPipe, PromptIds};
use super::retry::RetryPipeWrapper;
use super::simple::SimpleActionListingPipe;

/// Pipe returned by the registry: any strategy under the retry wrapper.
pub type ListingPipe = RetryPipeWrapper<Box<dyn ActionListingPipe>>;

type PipeConstructor = fn(
    Option<Arc<dyn CompletionService>>,
    Arc<ListingLogger>,
) -> Result<Box<dyn ActionListingPipe>, ListingError>;

const REGISTRY: &[(&str, PipeConstructor)] = &[("simple-markdown-table", markdown_table)];

fn markdown_table(
    service: Option<Arc<dyn CompletionService>>,
    logger: Arc<ListingLogger>,
) -> Result<Box<dyn ActionListingPipe>, ListingError> {
    Ok(Box::new(SimpleActionListingPipe::markdown_table(service)?.with_logger(logger)))
}

/// Named listing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionListingStrategy {
    #[serde(rename = "simple-markdown-table")]
    SimpleMarkdownTable,
}

impl ActionListingStrategy {
    pub const ALL: [ActionListingStrategy; 1] = [ActionListingStrategy::SimpleMarkdownTable];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionListingStrategy::SimpleMarkdownTable => "simple-markdown-table",
        }
    }

    /// Prompt ids the strategy's pipe sends, known before any pipe is built.
    pub fn prompt_ids(self) -> PromptIds<'static> {
        match self {
            ActionListingStrategy::SimpleMarkdownTable => PromptIds {
                fresh: ACTION_LISTING_PROMPT_ID,
                incremental: ACTION_LISTING_INCREMENTAL_PROMPT_ID,
            },
        }
    }

    /// Build this strategy's pipe wrapped for retries.
    pub fn pipe(
        self,
        service: Option<Arc<dyn CompletionService>>,
    ) -> Result<ListingPipe, ListingError> {
        resolve(self.as_str(), service)
    }

    /// Build this strategy's pipe with `logger` shared by the strategy and the wrapper.
    pub fn pipe_with(
        self,
        service: Option<Arc<dyn CompletionService>>,
        logger: Arc<ListingLogger>,
    ) -> Result<ListingPipe, ListingError> {
        resolve_with(self.as_str(), service, logger)
    }
}

impl fmt::Display for ActionListingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionListingStrategy {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| ListingError::UnknownStrategy(s.to_string()))
    }
}

/// Look up `name` and build its pipe, always wrapped in a [`RetryPipeWrapper`]
/// with the default budget and the default logger.
///
/// An unknown name fails before any pipe, model service, or completion is
/// created.
pub fn resolve(
    name: &str,
    service: Option<Arc<dyn CompletionService>>,
) -> Result<ListingPipe, ListingError> {
    resolve_with(name, service, Arc::new(ListingLogger::default()))
}

/// Like [`resolve`], handing `logger` to both the strategy and its retry wrapper.
pub fn resolve_with(
    name: &str,
    service: Option<Arc<dyn CompletionService>>,
    logger: Arc<ListingLogger>,
) -> Result<ListingPipe, ListingError> {
    let (_, constructor) = REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .ok_or_else(|| ListingError::UnknownStrategy(name.to_string()))?;
    let pipe = constructor(service, Arc::clone(&logger))?;
    Ok(RetryPipeWrapper::new(pipe).with_logger(logger))
}

/// Names accepted by [`resolve`], in registration order.
pub fn available_strategies() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_openai::types::CreateChatCompletionResponse;
    use async_trait::async_trait;

    use crate::config::DEFAULT_MAX_TRIES;
    use crate::context::tests::sample_context;
    use crate::llm::service::tests::completion_response;
    use crate::llm::{LlmError, PromptVariables};
    use crate::logging::LogLevel;
    use crate::logging::tests::capturing_logger;

    #[derive(Default)]
    struct CountingService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for CountingService {
        async fn completion(
            &self,
            _prompt_id: &str,
            _variables: &PromptVariables,
        ) -> Result<CreateChatCompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(completion_response(Some(
                "<action-listing>B1|Submit the search|-|Search</action-listing>",
            )))
        }
    }

    #[test]
    fn resolve_wraps_markdown_table_pipe() {
        let service = Arc::new(CountingService::default());
        let pipe = resolve("simple-markdown-table", Some(service.clone())).unwrap();

        assert_eq!(pipe.max_tries(), DEFAULT_MAX_TRIES);
        let ids = pipe.inner().prompt_ids().unwrap();
        assert_eq!(ids.fresh, "action-listing/optim");
        assert_eq!(ids.incremental, "action-listing-incr");
        assert_eq!(pipe.prompt_ids(), Some(ids));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_strategy_is_rejected_without_completion() {
        let service = Arc::new(CountingService::default());

        let result = resolve("nonexistent", Some(service.clone()));

        assert!(matches!(
            result,
            Err(ListingError::UnknownStrategy(ref name)) if name == "nonexistent"
        ));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn strategy_names_round_trip() {
        for strategy in ActionListingStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<ActionListingStrategy>().unwrap(), strategy);
            assert_eq!(strategy.to_string(), strategy.as_str());
        }
        assert_eq!(
            available_strategies().collect::<Vec<_>>(),
            vec!["simple-markdown-table"]
        );
        assert!("Simple-Markdown-Table".parse::<ActionListingStrategy>().is_err());
    }

    #[tokio::test]
    async fn resolved_pipe_lists_through_service() {
        let service = Arc::new(CountingService::default());
        let pipe = ActionListingStrategy::SimpleMarkdownTable
            .pipe(Some(service.clone()))
            .unwrap();

        let actions = pipe.list(&sample_context(), None).await.unwrap();

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].id, "B1");
        assert_eq!(actions[0].category, "Search");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn strategy_prompt_ids_match_the_built_pipe() {
        for strategy in ActionListingStrategy::ALL {
            let pipe = strategy
                .pipe(Some(Arc::new(CountingService::default())))
                .unwrap();
            assert_eq!(pipe.prompt_ids(), Some(strategy.prompt_ids()));
        }
    }

    #[tokio::test]
    async fn resolve_with_shares_logger_with_the_strategy() {
        let (logger, records) = capturing_logger();
        let service = Arc::new(CountingService::default());
        let pipe = resolve_with("simple-markdown-table", Some(service), logger).unwrap();

        pipe.list(&sample_context(), None).await.unwrap();

        let records = records.lock().unwrap();
        let reply = records
            .iter()
            .find(|record| {
                record.level == LogLevel::Debug && record.category.as_deref() == Some("listing")
            })
            .expect("raw reply is logged at debug");
        let content = reply.auxiliary.as_ref().unwrap()["content"].as_str().unwrap();
        assert!(content.contains("B1|Submit the search"));
    }

    #[test]
    fn wrapper_debug_names_the_budget() {
        let pipe = resolve("simple-markdown-table", Some(Arc::new(CountingService::default())))
            .unwrap()
            .with_max_tries(5);
        let rendered = format!("{pipe:?}");
        assert!(rendered.contains("max_tries: 5"));
        assert!(rendered.contains("action-listing/optim"));
    }
}
