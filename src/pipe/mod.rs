//! Action listing strategies.
//!
//! [`ActionListingPipe`] is the strategy contract. [`SimpleActionListingPipe`]
//! is the prompt-driven implementation, [`RetryPipeWrapper`] adds the retry and
//! degrade policy, and [`resolve`] maps strategy names to wrapped pipes.

pub mod listing;
pub mod markdown;
pub mod registry;
pub mod retry;
pub mod simple;

use std::sync::Arc;

pub use listing::{ActionListingPipe, PromptIds};
pub use markdown::MarkdownTableVariables;
pub use registry::{ActionListingStrategy, ListingPipe, available_strategies, resolve, resolve_with};
pub use retry::{RetryOutcome, RetryPipeWrapper};
pub use simple::{PromptVariableBuilder, SimpleActionListingPipe};

use crate::config::ListingConfig;
use crate::error::ListingError;
use crate::llm::{CompletionService, LlmService};

/// Model service used when a pipe is built without one, configured from the
/// environment.
pub fn default_completion_service() -> Result<Arc<dyn CompletionService>, ListingError> {
    let config = ListingConfig::from_env()?;
    Ok(Arc::new(LlmService::from_config(&config, None)?))
}
