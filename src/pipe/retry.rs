use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::DEFAULT_MAX_TRIES;
use crate::context::PageContext;
use crate::error::ListingError;
use crate::logging::ListingLogger;
use crate::metrics::{ListingFunction, SharedMetrics};
use crate::types::{Action, PossibleAction};

use super::listing::{ActionListingPipe, PromptIds};

/// Result of running a listing operation under the retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Done(T),
    /// Every attempt failed; one message per attempt, in order.
    Exhausted(Vec<String>),
}

/// Retries a wrapped pipe up to `max_tries` times per call.
///
/// Fresh listings fail with [`ListingError::RetriesExhausted`] once the budget
/// is spent. Incremental listings degrade instead, returning the previously
/// known actions so the caller can keep going.
pub struct RetryPipeWrapper<P> {
    pipe: P,
    max_tries: usize,
    logger: Arc<ListingLogger>,
    metrics: Option<SharedMetrics>,
}

impl<P: ActionListingPipe> fmt::Debug for RetryPipeWrapper<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPipeWrapper")
            .field("max_tries", &self.max_tries)
            .field("prompt_ids", &self.pipe.prompt_ids())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl<P: ActionListingPipe> RetryPipeWrapper<P> {
    pub fn new(pipe: P) -> Self {
        Self {
            pipe,
            max_tries: DEFAULT_MAX_TRIES,
            logger: Arc::new(ListingLogger::default()),
            metrics: None,
        }
    }

    /// Set the attempt budget; zero is raised to a single attempt.
    pub fn with_max_tries(mut self, max_tries: usize) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    pub fn with_logger(mut self, logger: Arc<ListingLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn inner(&self) -> &P {
        &self.pipe
    }

    pub fn into_inner(self) -> P {
        self.pipe
    }

    pub fn max_tries(&self) -> usize {
        self.max_tries
    }

    /// Run `call` until it succeeds or the budget is spent.
    pub async fn attempt<T, F, Fut>(
        &self,
        function: ListingFunction,
        mut call: F,
    ) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ListingError>>,
    {
        let mut errors = Vec::with_capacity(self.max_tries);

        for attempt in 1..=self.max_tries {
            match call().await {
                Ok(value) => {
                    self.record_attempt(function, true);
                    return RetryOutcome::Done(value);
                }
                Err(err) => {
                    self.record_attempt(function, false);
                    let message = err.to_string();
                    self.logger.warn(
                        "action listing attempt failed",
                        Some("listing"),
                        Some(json!({
                            "operation": function,
                            "attempt": attempt,
                            "max_tries": self.max_tries,
                            "error": message,
                        })),
                    );
                    errors.push(message);
                }
            }
        }

        RetryOutcome::Exhausted(errors)
    }

    fn record_attempt(&self, function: ListingFunction, succeeded: bool) {
        if let Some(metrics) = &self.metrics {
            if let Ok(mut metrics) = metrics.lock() {
                metrics.record_attempt(function, succeeded);
            }
        }
    }

    fn record_fallback(&self) {
        if let Some(metrics) = &self.metrics {
            if let Ok(mut metrics) = metrics.lock() {
                metrics.record_fallback();
            }
        }
    }
}

#[async_trait]
impl<P: ActionListingPipe> ActionListingPipe for RetryPipeWrapper<P> {
    async fn list(
        &self,
        context: &PageContext,
        previous: Option<&[Action]>,
    ) -> Result<Vec<PossibleAction>, ListingError> {
        match self
            .attempt(ListingFunction::List, move || self.pipe.list(context, previous))
            .await
        {
            RetryOutcome::Done(actions) => Ok(actions),
            RetryOutcome::Exhausted(errors) => {
                let err = ListingError::RetriesExhausted { errors };
                self.logger.error(err.to_string(), Some("listing"), None);
                Err(err)
            }
        }
    }

    async fn list_incremental(
        &self,
        context: &PageContext,
        previous: &[Action],
    ) -> Result<Vec<PossibleAction>, ListingError> {
        match self
            .attempt(ListingFunction::ListIncremental, move || {
                self.pipe.list_incremental(context, previous)
            })
            .await
        {
            RetryOutcome::Done(actions) => Ok(actions),
            RetryOutcome::Exhausted(errors) => {
                self.logger.error(
                    "failed to get incremental action list, returning previous actions",
                    Some("listing"),
                    Some(json!({
                        "tries": errors.len(),
                        "errors": errors,
                        "previous_actions": previous.len(),
                    })),
                );
                self.record_fallback();
                Ok(previous.iter().map(PossibleAction::from).collect())
            }
        }
    }

    fn prompt_ids(&self) -> Option<PromptIds<'_>> {
        self.pipe.prompt_ids()
    }
}
