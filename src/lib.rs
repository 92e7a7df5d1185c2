//! Action listing for page contexts.
//!
//! A listing pipe asks a language model which actions a page offers and parses
//! the reply into [`PossibleAction`]s, either from scratch or incrementally on
//! top of actions already known. Pipes are resolved by strategy name and always
//! come wrapped with a retry policy:
//!
//! ```no_run
//! # async fn run(context: action_listing_rs::PageContext) -> Result<(), action_listing_rs::ListingError> {
//! use action_listing_rs::pipe::{ActionListingPipe, resolve};
//!
//! let pipe = resolve("simple-markdown-table", None)?;
//! let actions = pipe.list(&context, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod parsing;
pub mod pipe;
pub mod types;

pub use config::{ListingConfig, ListingConfigOverrides, Verbosity};
pub use context::{ContextNode, PageContext};
pub use error::ListingError;
pub use pipe::{ActionListingPipe, ActionListingStrategy, ListingPipe, resolve, resolve_with};
pub use types::{Action, ActionParameter, ActionSpace, ActionStatus, PossibleAction};
