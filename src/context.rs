//! Page snapshot handed to the listing pipes.
//!
//! A [`PageContext`] is a tree of nodes; nodes carrying an `id` are interactive
//! and are the elements the model is asked to turn into actions.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::types::Action;

/// Node of the page tree. Nodes with an `id` are interactive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ContextNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContextNode>,
}

impl ContextNode {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            role: role.into(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn interactive(
        id: impl Into<String>,
        role: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(role, text)
        }
    }

    pub fn with_children(mut self, children: Vec<ContextNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.id.is_some()
    }

    fn contains_interactive(&self) -> bool {
        self.is_interactive() || self.children.iter().any(ContextNode::contains_interactive)
    }

    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(id) = &self.id {
            out.push(id);
        }
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    fn render(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}- ");
        if let Some(id) = &self.id {
            let _ = write!(out, "[{id}] ");
        }
        out.push_str(&self.role);
        if !self.text.is_empty() {
            let _ = write!(out, " \"{}\"", self.text);
        }
        out.push('\n');
        for child in &self.children {
            child.render(depth + 1, out);
        }
    }
}

/// Snapshot of a page's interactive surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageContext {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub root: ContextNode,
}

impl PageContext {
    pub fn new(url: impl Into<String>, root: ContextNode) -> Self {
        Self {
            url: url.into(),
            title: None,
            root,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Ids of all interactive nodes, in document order.
    pub fn interaction_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.root.collect_ids(&mut ids);
        ids
    }

    /// Textual description of the page used as the `document` prompt variable.
    pub fn markdown_description(&self) -> String {
        let mut out = String::new();
        match &self.title {
            Some(title) => {
                let _ = writeln!(out, "# {title}");
            }
            None => out.push_str("# Page\n"),
        }
        let _ = writeln!(out, "URL: {}\n", self.url);
        self.root.render(0, &mut out);
        out
    }

    /// Derive a context without the interactive nodes already covered by `actions`.
    ///
    /// Children of a removed node are kept and attached to its parent. Containers
    /// left without any interactive descendant are pruned; plain leaves stay. The
    /// root is always kept.
    pub fn subgraph_without(&self, actions: &[Action]) -> PageContext {
        let removed: HashSet<&str> = actions.iter().map(|action| action.id.as_str()).collect();

        let mut root = ContextNode {
            id: self
                .root
                .id
                .clone()
                .filter(|id| !removed.contains(id.as_str())),
            role: self.root.role.clone(),
            text: self.root.text.clone(),
            children: Vec::new(),
        };
        root.children = self
            .root
            .children
            .iter()
            .flat_map(|child| without_removed(child, &removed))
            .collect();

        PageContext {
            url: self.url.clone(),
            title: self.title.clone(),
            root,
        }
    }
}

fn without_removed(node: &ContextNode, removed: &HashSet<&str>) -> Vec<ContextNode> {
    let children: Vec<ContextNode> = node
        .children
        .iter()
        .flat_map(|child| without_removed(child, removed))
        .collect();

    match &node.id {
        Some(id) if removed.contains(id.as_str()) => children,
        None if !node.children.is_empty()
            && !children.iter().any(ContextNode::contains_interactive) =>
        {
            Vec::new()
        }
        _ => vec![ContextNode {
            id: node.id.clone(),
            role: node.role.clone(),
            text: node.text.clone(),
            children,
        }],
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_context() -> PageContext {
        PageContext::new(
            "https://shop.example.com",
            ContextNode::new("WebArea", "").with_children(vec![
                ContextNode::new("heading", "Welcome"),
                ContextNode::new("navigation", "").with_children(vec![
                    ContextNode::interactive("L1", "link", "Home"),
                    ContextNode::interactive("L2", "link", "Pricing"),
                ]),
                ContextNode::new("main", "").with_children(vec![
                    ContextNode::new("text", "Find a product"),
                    ContextNode::interactive("I1", "textbox", "Search"),
                    ContextNode::interactive("B1", "button", "Submit"),
                ]),
            ]),
        )
        .with_title("Example Shop")
    }

    #[test]
    fn markdown_description_renders_tree() {
        let rendered = sample_context().markdown_description();
        assert_eq!(
            rendered,
            "# Example Shop\nURL: https://shop.example.com\n\n\
             - WebArea\n  - heading \"Welcome\"\n  - navigation\n    - [L1] link \"Home\"\n    - [L2] link \"Pricing\"\n\
             \x20 - main\n    - text \"Find a product\"\n    - [I1] textbox \"Search\"\n    - [B1] button \"Submit\"\n"
        );
    }

    #[test]
    fn interaction_ids_follow_document_order() {
        assert_eq!(sample_context().interaction_ids(), vec!["L1", "L2", "I1", "B1"]);
    }

    #[test]
    fn subgraph_without_drops_known_actions_and_empty_branches() {
        let context = sample_context();
        let known = vec![
            Action::new("L1", "Open home", "Navigation"),
            Action::new("L2", "Open pricing", "Navigation"),
            Action::new("I1", "Fill search", "Search"),
        ];

        let reduced = context.subgraph_without(&known);

        assert_eq!(reduced.interaction_ids(), vec!["B1"]);
        let roles: Vec<&str> = reduced.root.children.iter().map(|n| n.role.as_str()).collect();
        assert_eq!(roles, vec!["heading", "main"]);
        assert_eq!(reduced.root.children[1].children.len(), 2);
        // input is untouched
        assert_eq!(context.interaction_ids().len(), 4);
    }

    #[test]
    fn subgraph_without_promotes_children_of_removed_nodes() {
        let context = PageContext::new(
            "https://example.com",
            ContextNode::new("WebArea", "").with_children(vec![
                ContextNode::interactive("B1", "button", "Menu")
                    .with_children(vec![ContextNode::interactive("L1", "link", "Docs")]),
            ]),
        );

        let reduced = context.subgraph_without(&[Action::new("B1", "Open menu", "Navigation")]);

        assert_eq!(reduced.interaction_ids(), vec!["L1"]);
        assert_eq!(reduced.root.children[0].role, "link");
    }

    #[test]
    fn subgraph_without_everything_keeps_root() {
        let context = sample_context();
        let known: Vec<Action> = context
            .interaction_ids()
            .into_iter()
            .map(|id| Action::new(id, "known", "Other"))
            .collect();

        let reduced = context.subgraph_without(&known);

        assert!(reduced.interaction_ids().is_empty());
        assert_eq!(reduced.root.role, "WebArea");
        assert_eq!(reduced.root.children.len(), 1);
        assert_eq!(reduced.root.children[0].text, "Welcome");
    }
}
