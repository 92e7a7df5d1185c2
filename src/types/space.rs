use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::action::{Action, ActionStatus};

/// Which actions of a space are rendered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionFilter {
    #[default]
    All,
    Valid,
    Failed,
    Excluded,
}

impl ActionFilter {
    fn accepts(self, status: ActionStatus) -> bool {
        match self {
            ActionFilter::All => true,
            ActionFilter::Valid => status == ActionStatus::Valid,
            ActionFilter::Failed => status == ActionStatus::Failed,
            ActionFilter::Excluded => status == ActionStatus::Excluded,
        }
    }
}

/// Ordered collection of known actions, rendered into prompts as markdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionSpace {
    actions: Vec<Action>,
}

impl ActionSpace {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn filtered(
        &self,
        filter: ActionFilter,
        include_special: bool,
    ) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(move |action| {
            filter.accepts(action.status) && (include_special || !action.is_special())
        })
    }

    /// Render the space grouped by category, in order of first appearance.
    ///
    /// ```text
    /// # Search
    /// * I1: Fill search box (query: string)
    /// ```
    pub fn markdown(&self, filter: ActionFilter, include_special: bool) -> String {
        let mut categories: Vec<(&str, Vec<&Action>)> = Vec::new();
        for action in self.filtered(filter, include_special) {
            match categories
                .iter_mut()
                .find(|(category, _)| *category == action.category)
            {
                Some((_, group)) => group.push(action),
                None => categories.push((action.category.as_str(), vec![action])),
            }
        }

        let mut out = String::new();
        for (index, (category, group)) in categories.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "# {category}");
            for action in group {
                let _ = write!(out, "* {}: {}", action.id, action.description);
                if !action.params.is_empty() {
                    let params: Vec<String> = action.params.iter().map(ToString::to_string).collect();
                    let _ = write!(out, " ({})", params.join(", "));
                }
                out.push('\n');
            }
        }
        out
    }
}

impl From<&[Action]> for ActionSpace {
    fn from(actions: &[Action]) -> Self {
        Self::new(actions.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::action::ActionParameter;

    fn sample_space() -> ActionSpace {
        ActionSpace::new(vec![
            Action::new("L1", "Open home page", "Navigation"),
            Action::new("I1", "Fill search box", "Search")
                .with_params(vec![ActionParameter::new("query", "string")]),
            Action::new("S1", "Go to URL", "Special Browser Actions"),
            Action::new("L2", "Open pricing", "Navigation").with_status(ActionStatus::Failed),
        ])
    }

    #[test]
    fn markdown_groups_by_first_appearance_and_drops_special() {
        let rendered = sample_space().markdown(ActionFilter::All, false);
        assert_eq!(
            rendered,
            "# Navigation\n* L1: Open home page\n* L2: Open pricing\n\n# Search\n* I1: Fill search box (query: string)\n"
        );
    }

    #[test]
    fn markdown_keeps_special_when_requested() {
        let rendered = sample_space().markdown(ActionFilter::All, true);
        assert!(rendered.contains("# Special Browser Actions\n* S1: Go to URL\n"));
    }

    #[test]
    fn filter_selects_by_status() {
        let rendered = sample_space().markdown(ActionFilter::Failed, false);
        assert_eq!(rendered, "# Navigation\n* L2: Open pricing\n");
    }

    #[test]
    fn empty_space_renders_empty_string() {
        assert_eq!(ActionSpace::default().markdown(ActionFilter::All, false), "");
    }
}
