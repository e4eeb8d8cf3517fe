//! Core type definitions for TLDRR
//!
//! These types are shared by the controller, the presentation helpers and
//! the service crate that answers the controller's requests.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Actions
// =============================================================================

/// A user-triggerable action on a control cluster button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Summarize the element's body
    Tldr,
    /// Translate the element's body to English
    Translate,
    /// Explain the element's body like the reader is five
    Eli5,
    /// Clean up spacing, punctuation and grammar
    Format,
    /// Summarize the whole thread (page-level, ignores the owning element)
    ThreadTldr,
}

impl Action {
    /// Parse from the `data-action` tag carried by a control button.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tldr" => Some(Self::Tldr),
            "translate" => Some(Self::Translate),
            "eli5" => Some(Self::Eli5),
            "format" => Some(Self::Format),
            "thread-tldr" => Some(Self::ThreadTldr),
            _ => None,
        }
    }

    /// The tag written to `data-action` and sent as the service request type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tldr => "tldr",
            Self::Translate => "translate",
            Self::Eli5 => "eli5",
            Self::Format => "format",
            Self::ThreadTldr => "thread-tldr",
        }
    }

    /// Human-readable label shown in a result panel header.
    pub fn label(self) -> &'static str {
        match self {
            Self::Tldr => "TL;DR",
            Self::Translate => "Translation",
            Self::Eli5 => "ELI5",
            Self::Format => "Formatted",
            Self::ThreadTldr => "Thread TL;DR",
        }
    }

    /// Short label rendered on the inline button.
    pub fn button_label(self) -> &'static str {
        match self {
            Self::Tldr => "TL;DR",
            Self::Translate => "Translate",
            Self::Eli5 => "ELI5",
            Self::Format => "Format",
            Self::ThreadTldr => "TL;DR ALL",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Tldr => "📝",
            Self::Translate => "🌐",
            Self::Eli5 => "🧒",
            Self::Format => "✨",
            Self::ThreadTldr => "📊",
        }
    }

    /// Button tooltip.
    pub fn title(self) -> &'static str {
        match self {
            Self::Tldr => "TL;DR Summary",
            Self::Translate => "Translate",
            Self::Eli5 => "Explain Like I'm 5",
            Self::Format => "Format & Clean Text",
            Self::ThreadTldr => "TL;DR of entire thread",
        }
    }

    /// Page-level actions ignore the element whose cluster they were clicked from.
    pub fn is_page_level(self) -> bool {
        matches!(self, Self::ThreadTldr)
    }

    fn flag(self) -> ActionSet {
        match self {
            Self::Tldr => ActionSet::TLDR,
            Self::Translate => ActionSet::TRANSLATE,
            Self::Eli5 => ActionSet::ELI5,
            Self::Format => ActionSet::FORMAT,
            Self::ThreadTldr => ActionSet::THREAD_TLDR,
        }
    }
}

// =============================================================================
// Action Sets (which buttons a cluster carries)
// =============================================================================

bitflags::bitflags! {
    /// Set of actions offered by one control cluster.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ActionSet: u8 {
        const TLDR = 1 << 0;
        const ELI5 = 1 << 1;
        const TRANSLATE = 1 << 2;
        const THREAD_TLDR = 1 << 3;
        const FORMAT = 1 << 4;

        /// Cluster attached to a post
        const POST = Self::TLDR.bits() | Self::ELI5.bits() | Self::TRANSLATE.bits() | Self::THREAD_TLDR.bits();
        /// Cluster attached to a comment
        const COMMENT = Self::TLDR.bits() | Self::TRANSLATE.bits();
    }
}

impl ActionSet {
    /// Render order of the buttons in a cluster.
    const ORDER: [Action; 5] = [
        Action::Tldr,
        Action::Eli5,
        Action::Translate,
        Action::Format,
        Action::ThreadTldr,
    ];

    pub fn has(self, action: Action) -> bool {
        self.contains(action.flag())
    }

    /// Actions in button order.
    pub fn actions(self) -> impl Iterator<Item = Action> {
        Self::ORDER.into_iter().filter(move |a| self.has(*a))
    }
}

// =============================================================================
// Element Kinds
// =============================================================================

/// Kind of tracked host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Post,
    Comment,
}

impl ElementKind {
    /// Buttons offered for this kind.
    pub fn actions(self) -> ActionSet {
        match self {
            Self::Post => ActionSet::POST,
            Self::Comment => ActionSet::COMMENT,
        }
    }
}

// =============================================================================
// Panel Kinds
// =============================================================================

/// What a result panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    /// Output of an action (or the degraded summary for tldr)
    Result(Action),
    /// Failure message of an action
    Error,
}

impl PanelKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Result(action) => action.label(),
            Self::Error => "Error",
        }
    }

    /// Suffix of the `tdlrr-result-*` class.
    pub fn class_suffix(self) -> &'static str {
        match self {
            Self::Result(action) => action.as_str(),
            Self::Error => "error",
        }
    }
}

// =============================================================================
// Service Envelope
// =============================================================================

/// Uniform answer of the translation service.
///
/// Serialized as `{success: true, data}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl ServiceResponse {
    pub fn success(data: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Collapse into a `Result`, treating `success: true` without data as empty output.
    pub fn into_result(self) -> Result<String, String> {
        if self.success {
            Ok(self.data.unwrap_or_default())
        } else {
            Err(self.error.unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tags_round_trip() {
        for action in ActionSet::all().actions() {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
        assert_eq!(Action::parse("thread-summary"), None);
    }

    #[test]
    fn test_cluster_button_order() {
        let post: Vec<_> = ElementKind::Post.actions().actions().collect();
        assert_eq!(post, vec![Action::Tldr, Action::Eli5, Action::Translate, Action::ThreadTldr]);

        let comment: Vec<_> = ElementKind::Comment.actions().actions().collect();
        assert_eq!(comment, vec![Action::Tldr, Action::Translate]);
    }

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(ServiceResponse::success("hi")).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": "hi"}));

        let err: ServiceResponse =
            serde_json::from_str(r#"{"success":false,"error":"boom"}"#).unwrap();
        assert_eq!(err.into_result(), Err("boom".to_string()));
    }
}
