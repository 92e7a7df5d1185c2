use std::collections::HashMap;

use super::error::LlmError;

/// Variables substituted into `{{name}}` placeholders of a prompt template.
pub type PromptVariables = HashMap<String, String>;

/// Prompt id for listing all actions of a page from scratch.
pub const ACTION_LISTING_PROMPT_ID: &str = "action-listing/optim";

/// Prompt id for listing only the actions missing from a known list.
pub const ACTION_LISTING_INCREMENTAL_PROMPT_ID: &str = "action-listing-incr";

const LISTING_FORMAT_RULES: &str = "Identify every interactive element in the document and describe the action a user can take with it.\n\nRules:\n- Use the element id shown in square brackets as the action ID (e.g. L1 for links, B1 for buttons, I1 for inputs).\n- Write each description as a short imperative sentence (\"Open the pricing page\").\n- List parameters as `name: type`, separated by `;`. Use `name: type[v1, v2]` for a fixed set of values and append `= value` for a default.\n- Group related actions under a short category name (\"Navigation\", \"Search\", \"Forms\", ...).\n- Never list browser-level actions such as going back or opening a URL.\n\nAnswer with a markdown table with the columns `ID | Description | Parameters | Category`, wrapped in <action-listing></action-listing> tags.";

const ACTION_LISTING_SYSTEM: &str = "You are a web agent that lists the actions available on a web page.";

const ACTION_LISTING_USER: &str = "{{rules}}\n\nDocument:\n{{document}}";

const ACTION_LISTING_INCREMENTAL_USER: &str = "{{rules}}\n\nThe following actions were already listed for this page and must not be repeated:\n{{previous_action_list}}\n\nList only the actions for the remaining elements of the document. If an element's action already appears above, skip it.\n\nDocument:\n{{document}}";

/// System and user message templates registered under a prompt id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub system: &'static str,
    pub user: &'static str,
}

/// Rendered system and user messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    /// Fill every `{{name}}` placeholder. `{{rules}}` is built in; every other
    /// placeholder must be present in `variables`.
    pub fn render(&self, variables: &PromptVariables) -> Result<RenderedPrompt, LlmError> {
        Ok(RenderedPrompt {
            system: render_template(self.id, self.system, variables)?,
            user: render_template(self.id, self.user, variables)?,
        })
    }
}

/// Built-in prompt templates keyed by prompt id.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: Vec<PromptTemplate>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self {
            templates: vec![
                PromptTemplate {
                    id: ACTION_LISTING_PROMPT_ID,
                    system: ACTION_LISTING_SYSTEM,
                    user: ACTION_LISTING_USER,
                },
                PromptTemplate {
                    id: ACTION_LISTING_INCREMENTAL_PROMPT_ID,
                    system: ACTION_LISTING_SYSTEM,
                    user: ACTION_LISTING_INCREMENTAL_USER,
                },
            ],
        }
    }
}

impl PromptLibrary {
    pub fn get(&self, prompt_id: &str) -> Result<&PromptTemplate, LlmError> {
        self.templates
            .iter()
            .find(|template| template.id == prompt_id)
            .ok_or_else(|| LlmError::UnknownPrompt(prompt_id.to_string()))
    }

    pub fn render(
        &self,
        prompt_id: &str,
        variables: &PromptVariables,
    ) -> Result<RenderedPrompt, LlmError> {
        self.get(prompt_id)?.render(variables)
    }
}

fn render_template(
    prompt_id: &str,
    template: &str,
    variables: &PromptVariables,
) -> Result<String, LlmError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = rest[start + 2..start + 2 + len].trim();
        match (name, variables.get(name)) {
            (_, Some(value)) => out.push_str(value),
            ("rules", None) => out.push_str(LISTING_FORMAT_RULES),
            (_, None) => {
                return Err(LlmError::MissingVariable {
                    prompt_id: prompt_id.to_string(),
                    variable: name.to_string(),
                });
            }
        }
        rest = &rest[start + 2 + len + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> PromptVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fresh_prompt_embeds_document() {
        let rendered = PromptLibrary::default()
            .render(ACTION_LISTING_PROMPT_ID, &vars(&[("document", "- [B1] button")]))
            .unwrap();
        assert!(rendered.user.ends_with("Document:\n- [B1] button"));
        assert!(rendered.user.contains("<action-listing></action-listing>"));
        assert!(!rendered.user.contains("{{"));
    }

    #[test]
    fn incremental_prompt_requires_previous_list() {
        let err = PromptLibrary::default()
            .render(
                ACTION_LISTING_INCREMENTAL_PROMPT_ID,
                &vars(&[("document", "- [B1] button")]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::MissingVariable { ref variable, .. } if variable == "previous_action_list"
        ));
    }

    #[test]
    fn unknown_prompt_is_rejected() {
        let err = PromptLibrary::default()
            .render("nope", &PromptVariables::new())
            .unwrap_err();
        assert!(matches!(err, LlmError::UnknownPrompt(id) if id == "nope"));
    }

    #[test]
    fn unterminated_placeholder_is_kept_verbatim() {
        let out = render_template("t", "a {{b", &PromptVariables::new()).unwrap();
        assert_eq!(out, "a {{b");
    }
}
