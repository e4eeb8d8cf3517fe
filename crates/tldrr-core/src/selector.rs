//! Simple selectors and ordered fallback chains
//!
//! Host markup varies between page versions, so every lookup the
//! controller does goes through a [`SelectorChain`]: a list of simple
//! selectors tried in priority order, first match wins. Only the selector
//! shapes the host profile needs are supported: a tag name, a `.class`,
//! an `#id` or an `[attr="value"]` equality test.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::Dom;

/// Error type for selector parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,
    #[error("Unsupported selector: {0}")]
    Unsupported(String),
    #[error("Unterminated attribute selector: {0}")]
    Unterminated(String),
}

/// A single simple selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    /// Tag name, compared case-insensitively
    Tag(String),
    /// `.class`
    Class(String),
    /// `#id`
    Id(String),
    /// `[name="value"]`
    Attr { name: String, value: String },
}

impl Selector {
    pub fn tag(name: &str) -> Self {
        Self::Tag(name.to_ascii_lowercase())
    }

    pub fn class(name: &str) -> Self {
        Self::Class(name.to_string())
    }

    pub fn id(name: &str) -> Self {
        Self::Id(name.to_string())
    }

    pub fn attr(name: &str, value: &str) -> Self {
        Self::Attr {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Parse CSS-like selector text.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SelectorError::Empty);
        }

        if let Some(rest) = text.strip_prefix('.') {
            return simple_ident(rest, text).map(Self::Class);
        }
        if let Some(rest) = text.strip_prefix('#') {
            return simple_ident(rest, text).map(Self::Id);
        }
        if let Some(rest) = text.strip_prefix('[') {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| SelectorError::Unterminated(text.to_string()))?;
            let (name, value) = inner
                .split_once('=')
                .ok_or_else(|| SelectorError::Unsupported(text.to_string()))?;
            let value = unquote(value.trim());
            let name = simple_ident(name.trim(), text)?;
            return Ok(Self::Attr {
                name,
                value: value.to_string(),
            });
        }

        simple_ident(text, text).map(|t| Self::Tag(t.to_ascii_lowercase()))
    }
}

fn simple_ident(ident: &str, whole: &str) -> Result<String, SelectorError> {
    let valid = !ident.is_empty()
        && ident
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(ident.to_string())
    } else {
        Err(SelectorError::Unsupported(whole.to_string()))
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(name) => write!(f, "{name}"),
            Self::Class(name) => write!(f, ".{name}"),
            Self::Id(name) => write!(f, "#{name}"),
            Self::Attr { name, value } => write!(f, "[{name}=\"{value}\"]"),
        }
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(value: Selector) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Fallback Chains
// =============================================================================

/// Ordered list of selectors, tried first to last.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorChain(pub Vec<Selector>);

impl SelectorChain {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self(selectors)
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.0
    }

    /// First descendant of `scope` matching the earliest selector that matches anything.
    pub fn first_match<D: Dom>(&self, dom: &D, scope: &D::Element) -> Option<D::Element> {
        self.0.iter().find_map(|selector| dom.query(scope, selector))
    }
}

impl From<Vec<Selector>> for SelectorChain {
    fn from(value: Vec<Selector>) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shapes() {
        assert_eq!(Selector::parse("shreddit-post"), Ok(Selector::tag("shreddit-post")));
        assert_eq!(Selector::parse("SHREDDIT-POST"), Ok(Selector::tag("shreddit-post")));
        assert_eq!(Selector::parse(".md"), Ok(Selector::class("md")));
        assert_eq!(Selector::parse("#tdlrr-toolbar"), Ok(Selector::id("tdlrr-toolbar")));
        assert_eq!(
            Selector::parse(r#"[slot="text-body"]"#),
            Ok(Selector::attr("slot", "text-body"))
        );
        assert_eq!(Selector::parse("[slot=x]"), Ok(Selector::attr("slot", "x")));
    }

    #[test]
    fn test_parse_rejects_compound() {
        assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
        assert!(matches!(Selector::parse("div .md"), Err(SelectorError::Unsupported(_))));
        assert!(matches!(Selector::parse("[slot"), Err(SelectorError::Unterminated(_))));
    }

    #[test]
    fn test_display_is_css() {
        for text in ["shreddit-comment", ".usertext-body", "#tdlrr-thread-summarizer", "[slot=\"text-body\"]"] {
            assert_eq!(Selector::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_chain_deserializes_from_strings() {
        let chain: SelectorChain =
            serde_json::from_str(r#"["[slot=\"text-body\"]", ".usertext-body", ".md"]"#).unwrap();
        assert_eq!(
            chain.selectors(),
            &[
                Selector::attr("slot", "text-body"),
                Selector::class("usertext-body"),
                Selector::class("md"),
            ]
        );
    }
}
