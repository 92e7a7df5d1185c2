use async_trait::async_trait;

use crate::context::PageContext;
use crate::error::ListingError;
use crate::types::{Action, PossibleAction};

/// Prompt ids a pipe sends for fresh and incremental listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptIds<'a> {
    pub fresh: &'a str,
    pub incremental: &'a str,
}

/// A strategy producing candidate actions for a page.
///
/// Implementations never mutate `context` or `previous`; every derived value is
/// computed per call.
#[async_trait]
pub trait ActionListingPipe: Send + Sync {
    /// List every action of `context`. `previous`, when given, only feeds the
    /// prompt variables.
    async fn list(
        &self,
        context: &PageContext,
        previous: Option<&[Action]>,
    ) -> Result<Vec<PossibleAction>, ListingError>;

    /// List the actions of `context` not already covered by `previous`, which
    /// may be empty.
    async fn list_incremental(
        &self,
        context: &PageContext,
        previous: &[Action],
    ) -> Result<Vec<PossibleAction>, ListingError>;

    /// Prompt ids used by prompt-driven pipes.
    fn prompt_ids(&self) -> Option<PromptIds<'_>> {
        None
    }
}

#[async_trait]
impl<P: ActionListingPipe + ?Sized> ActionListingPipe for Box<P> {
    async fn list(
        &self,
        context: &PageContext,
        previous: Option<&[Action]>,
    ) -> Result<Vec<PossibleAction>, ListingError> {
        (**self).list(context, previous).await
    }

    async fn list_incremental(
        &self,
        context: &PageContext,
        previous: &[Action],
    ) -> Result<Vec<PossibleAction>, ListingError> {
        (**self).list_incremental(context, previous).await
    }

    fn prompt_ids(&self) -> Option<PromptIds<'_>> {
        (**self).prompt_ids()
    }
}
