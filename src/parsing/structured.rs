use thiserror::Error;

/// Errors raised while pulling a tagged payload out of model output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no <{tag}> tag found in model output")]
    MissingTag { tag: String },
    #[error("<{tag}> tag found but its content is empty")]
    EmptyContent { tag: String },
}

/// Extractor for payloads wrapped in an XML-like tag, e.g.
/// `<action-listing>...</action-listing>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredContent {
    outer_tag: String,
}

impl StructuredContent {
    pub fn new(outer_tag: impl Into<String>) -> Self {
        Self {
            outer_tag: outer_tag.into(),
        }
    }

    pub fn outer_tag(&self) -> &str {
        &self.outer_tag
    }

    /// Return the trimmed text of the first tag pair with a non-empty payload.
    ///
    /// Empty pairs (e.g. an echoed `<action-listing></action-listing>`) are
    /// skipped. A missing closing tag is tolerated (truncated replies keep
    /// everything after the opening tag). A markdown code fence wrapping the
    /// payload is stripped.
    pub fn extract(&self, text: &str) -> Result<String, ExtractionError> {
        let open = format!("<{}>", self.outer_tag);
        let close = format!("</{}>", self.outer_tag);

        let mut cursor = 0;
        let mut found = false;
        while let Some(offset) = text[cursor..].find(&open) {
            found = true;
            let start = cursor + offset + open.len();
            let rest = &text[start..];
            let (inner, next) = match rest.find(&close) {
                Some(end) => (&rest[..end], start + end + close.len()),
                None => (rest, text.len()),
            };

            let payload = strip_code_fence(inner.trim());
            if !payload.is_empty() {
                return Ok(payload.to_string());
            }
            cursor = next;
        }

        let tag = self.outer_tag.clone();
        if found {
            Err(ExtractionError::EmptyContent { tag })
        } else {
            Err(ExtractionError::MissingTag { tag })
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language hint on the opening fence line
    let body = match body.find('\n') {
        Some(newline) => &body[newline + 1..],
        None => "",
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> StructuredContent {
        StructuredContent::new("action-listing")
    }

    #[test]
    fn extracts_payload_between_tags() {
        let text = "Sure! <action-listing>\nA|doA\nB|doB\n</action-listing> done";
        assert_eq!(listing().extract(text).unwrap(), "A|doA\nB|doB");
    }

    #[test]
    fn tolerates_missing_closing_tag() {
        let text = "<action-listing>A|doA";
        assert_eq!(listing().extract(text).unwrap(), "A|doA");
    }

    #[test]
    fn strips_markdown_code_fence() {
        let text = "<action-listing>\n```markdown\n| ID | Description |\n| L1 | Home |\n```\n</action-listing>";
        assert_eq!(
            listing().extract(text).unwrap(),
            "| ID | Description |\n| L1 | Home |"
        );
    }

    #[test]
    fn missing_tag_is_an_error() {
        let err = listing().extract("no listing here").unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingTag {
                tag: "action-listing".to_string()
            }
        );
    }

    #[test]
    fn whitespace_payload_is_an_error() {
        let err = listing()
            .extract("<action-listing>  \n </action-listing>")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyContent { .. }));
    }

    #[test]
    fn skips_echoed_empty_pair_before_payload() {
        let text = "The format is <action-listing></action-listing>, so:\n\
                    <action-listing>\nA|doA\n</action-listing>";
        assert_eq!(listing().extract(text).unwrap(), "A|doA");
    }

    #[test]
    fn only_empty_pairs_is_empty_content() {
        let err = listing()
            .extract("<action-listing></action-listing> <action-listing> </action-listing>")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyContent { .. }));
    }
}
