//! Action value types shared by the parsers, pipes, and prompt rendering.

pub mod action;
pub mod space;

pub use action::{Action, ActionParameter, ActionStatus, PossibleAction, SPECIAL_ACTION_PREFIX};
pub use space::{ActionFilter, ActionSpace};
