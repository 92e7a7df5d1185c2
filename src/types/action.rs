use std::fmt;

use serde::{Deserialize, Serialize};

/// Id prefix reserved for browser-level actions (goto, back, scroll, ...).
pub const SPECIAL_ACTION_PREFIX: char = 'S';

/// Declared parameter of an action, e.g. the text typed into a search box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl ActionParameter {
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            default: None,
            values: Vec::new(),
        }
    }
}

impl fmt::Display for ActionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.param_type)?;
        if !self.values.is_empty() {
            write!(f, "[{}]", self.values.join(", "))?;
        }
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

/// Execution status of a confirmed action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    Valid,
    Failed,
    Excluded,
}

/// A confirmed interactive element, known from a previous listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub id: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub params: Vec<ActionParameter>,
    #[serde(default)]
    pub status: ActionStatus,
}

impl Action {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            category: category.into(),
            params: Vec::new(),
            status: ActionStatus::Valid,
        }
    }

    pub fn with_params(mut self, params: Vec<ActionParameter>) -> Self {
        self.params = params;
        self
    }

    pub fn with_status(mut self, status: ActionStatus) -> Self {
        self.status = status;
        self
    }

    /// Browser-level actions are not part of the page and never listed by the model.
    pub fn is_special(&self) -> bool {
        is_special_id(&self.id)
    }
}

/// Candidate action proposed by the model for the current page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PossibleAction {
    pub id: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub params: Vec<ActionParameter>,
}

impl PossibleAction {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            category: category.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<ActionParameter>) -> Self {
        self.params = params;
        self
    }
}

impl From<&Action> for PossibleAction {
    fn from(action: &Action) -> Self {
        Self {
            id: action.id.clone(),
            description: action.description.clone(),
            category: action.category.clone(),
            params: action.params.clone(),
        }
    }
}

pub(crate) fn is_special_id(id: &str) -> bool {
    id.strip_prefix(SPECIAL_ACTION_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}
