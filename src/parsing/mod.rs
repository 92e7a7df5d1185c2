//! Turning raw model replies into candidate actions.
//!
//! Replies wrap the listing in a tag ([`StructuredContent`]); the inner text is
//! handed to a [`ListingParser`] selected by the pipe.

pub mod structured;
pub mod table;

use thiserror::Error;

use crate::types::PossibleAction;

pub use structured::{ExtractionError, StructuredContent};
pub use table::TableListingParser;

/// Tag wrapping the listing in model replies.
pub const ACTION_LISTING_TAG: &str = "action-listing";

/// Errors raised when extracted text does not match the parser grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("listing contains no action rows")]
    NoRows,
    #[error("listing header has no {column} column")]
    MissingColumn { column: &'static str },
    #[error("malformed listing row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
    #[error("malformed parameter '{value}' at line {line}")]
    MalformedParameter { line: usize, value: String },
}

/// Grammar turning extracted listing text into ordered candidate actions.
pub trait ListingParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Vec<PossibleAction>, ParseError>;
}

/// Built-in listing grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionListingParser {
    Table,
}

impl ListingParser for ActionListingParser {
    fn parse(&self, text: &str) -> Result<Vec<PossibleAction>, ParseError> {
        match self {
            ActionListingParser::Table => TableListingParser.parse(text),
        }
    }
}
