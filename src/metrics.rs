//! Token, latency, and retry accounting for the listing pipes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_openai::types::CreateChatCompletionResponse;
use serde::{Deserialize, Serialize};

use crate::llm::MetricsCallback;

/// Listing operations tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingFunction {
    List,
    ListIncremental,
}

impl ListingFunction {
    /// Classify a prompt id against the incremental prompt of the strategy in
    /// use; anything else counts as a fresh listing.
    pub fn for_prompt(prompt_id: &str, incremental_prompt_id: &str) -> Self {
        if prompt_id == incremental_prompt_id {
            ListingFunction::ListIncremental
        } else {
            ListingFunction::List
        }
    }
}

/// Aggregated metrics for both listing operations.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingMetrics {
    pub list_prompt_tokens: u64,
    pub list_completion_tokens: u64,
    pub list_inference_time_ms: u64,
    pub list_attempts: u64,
    pub list_failures: u64,

    pub incremental_prompt_tokens: u64,
    pub incremental_completion_tokens: u64,
    pub incremental_inference_time_ms: u64,
    pub incremental_attempts: u64,
    pub incremental_failures: u64,
    pub incremental_fallbacks: u64,

    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_inference_time_ms: u64,
}

/// Shared handle updated by the retry wrapper and the model service callback.
pub type SharedMetrics = Arc<Mutex<ListingMetrics>>;

impl ListingMetrics {
    pub fn shared() -> SharedMetrics {
        Arc::new(Mutex::new(ListingMetrics::default()))
    }

    /// Merge the values from another metrics instance into this one.
    pub fn merge(&mut self, other: &ListingMetrics) {
        self.list_prompt_tokens += other.list_prompt_tokens;
        self.list_completion_tokens += other.list_completion_tokens;
        self.list_inference_time_ms += other.list_inference_time_ms;
        self.list_attempts += other.list_attempts;
        self.list_failures += other.list_failures;

        self.incremental_prompt_tokens += other.incremental_prompt_tokens;
        self.incremental_completion_tokens += other.incremental_completion_tokens;
        self.incremental_inference_time_ms += other.incremental_inference_time_ms;
        self.incremental_attempts += other.incremental_attempts;
        self.incremental_failures += other.incremental_failures;
        self.incremental_fallbacks += other.incremental_fallbacks;

        self.total_prompt_tokens += other.total_prompt_tokens;
        self.total_completion_tokens += other.total_completion_tokens;
        self.total_inference_time_ms += other.total_inference_time_ms;
    }

    /// Record token usage and latency of one completion.
    pub fn record_usage(
        &mut self,
        function: ListingFunction,
        prompt_tokens: u64,
        completion_tokens: u64,
        inference_time_ms: u64,
    ) {
        match function {
            ListingFunction::List => {
                self.list_prompt_tokens += prompt_tokens;
                self.list_completion_tokens += completion_tokens;
                self.list_inference_time_ms += inference_time_ms;
            }
            ListingFunction::ListIncremental => {
                self.incremental_prompt_tokens += prompt_tokens;
                self.incremental_completion_tokens += completion_tokens;
                self.incremental_inference_time_ms += inference_time_ms;
            }
        }

        self.total_prompt_tokens += prompt_tokens;
        self.total_completion_tokens += completion_tokens;
        self.total_inference_time_ms += inference_time_ms;
    }

    pub fn record_attempt(&mut self, function: ListingFunction, succeeded: bool) {
        match function {
            ListingFunction::List => {
                self.list_attempts += 1;
                if !succeeded {
                    self.list_failures += 1;
                }
            }
            ListingFunction::ListIncremental => {
                self.incremental_attempts += 1;
                if !succeeded {
                    self.incremental_failures += 1;
                }
            }
        }
    }

    pub fn record_fallback(&mut self) {
        self.incremental_fallbacks += 1;
    }
}

/// Build an [`LlmService`](crate::llm::LlmService) callback feeding token usage into `metrics`.
///
/// `incremental_prompt_id` is the incremental prompt of the strategy sharing the
/// service, see [`ActionListingStrategy::prompt_ids`](crate::pipe::ActionListingStrategy::prompt_ids).
pub fn usage_callback(
    metrics: SharedMetrics,
    incremental_prompt_id: impl Into<String>,
) -> MetricsCallback {
    let incremental_prompt_id = incremental_prompt_id.into();
    Arc::new(
        move |response: &CreateChatCompletionResponse, elapsed: Duration, prompt_id: &str| {
            let (prompt_tokens, completion_tokens) = response
                .usage
                .as_ref()
                .map(|usage| (usage.prompt_tokens as u64, usage.completion_tokens as u64))
                .unwrap_or_default();
            if let Ok(mut metrics) = metrics.lock() {
                metrics.record_usage(
                    ListingFunction::for_prompt(prompt_id, &incremental_prompt_id),
                    prompt_tokens,
                    completion_tokens,
                    elapsed.as_millis() as u64,
                );
            }
        },
    )
}
