//! Request types and prompt construction

use std::fmt;

use serde::{Deserialize, Serialize};
use tldrr_core::Action;

/// Characters of a thread document forwarded to the model.
pub const THREAD_INPUT_LIMIT: usize = 15_000;

/// Transformation requested from the model.
///
/// Unrecognised wire names are kept in `Other` and fall back to a plain
/// translation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    Translate,
    Tldr,
    Eli5,
    Format,
    ThreadTldr,
    ThreadSummary,
    Other(String),
}

impl RequestType {
    pub fn parse(s: &str) -> Self {
        match s {
            "translate" => Self::Translate,
            "tldr" => Self::Tldr,
            "eli5" => Self::Eli5,
            "format" => Self::Format,
            "thread-tldr" => Self::ThreadTldr,
            "thread-summary" => Self::ThreadSummary,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Translate => "translate",
            Self::Tldr => "tldr",
            Self::Eli5 => "eli5",
            Self::Format => "format",
            Self::ThreadTldr => "thread-tldr",
            Self::ThreadSummary => "thread-summary",
            Self::Other(name) => name,
        }
    }

    pub fn is_thread(&self) -> bool {
        matches!(self, Self::ThreadTldr | Self::ThreadSummary)
    }

    /// Full prompt for `text`. Thread documents are cut to
    /// [`THREAD_INPUT_LIMIT`] characters.
    pub fn prompt(&self, text: &str) -> String {
        match self {
            Self::Translate => format!(
                "Translate the following text from Hindi/Hinglish to fluent English. Preserve the original meaning and tone, but make it natural and readable in English:\n\n{text}"
            ),
            Self::Tldr => format!(
                "Create a comprehensive yet concise TL;DR summary that captures ALL key points, main ideas, and essential details without missing anything important. Structure it in 3-5 bullet points or short paragraphs that cover the complete scope:\n\n{text}"
            ),
            Self::Eli5 => format!(
                "Explain this concept to a young child (5-8 years old) in great detail. Use very simple words, analogies that kids understand, step-by-step explanations, and be thorough but age-appropriate. Make it educational and engaging:\n\n{text}"
            ),
            Self::Format => format!(
                "Clean up and format the following Hinglish text. Fix spacing, punctuation, and grammar while preserving the original meaning:\n\n{text}"
            ),
            Self::ThreadTldr | Self::ThreadSummary => {
                let input = truncate_chars(text, THREAD_INPUT_LIMIT);
                format!("{THREAD_PROMPT}\n\n{input}")
            }
            Self::Other(_) => format!("Translate the following text to English:\n\n{text}"),
        }
    }
}

const THREAD_PROMPT: &str = "Create a comprehensive TL;DR summary of this entire Reddit thread (post + all comments). Cover ALL key aspects without missing important points:

• Main topic and original question/post
• Key insights and information shared
• Most important advice or solutions
• Common opinions and consensus
• Notable disagreements or debates
• Best answers or most helpful comments
• Overall conclusion and takeaways

Be thorough but concise - don't miss any important details:";

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl From<String> for RequestType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<RequestType> for String {
    fn from(t: RequestType) -> Self {
        t.as_str().to_string()
    }
}

impl From<Action> for RequestType {
    fn from(action: Action) -> Self {
        Self::parse(action.as_str())
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        for name in ["translate", "tldr", "eli5", "format", "thread-tldr", "thread-summary"] {
            assert_eq!(RequestType::parse(name).as_str(), name);
        }
        assert_eq!(RequestType::parse("shout"), RequestType::Other("shout".into()));
        assert_eq!(RequestType::from(Action::ThreadTldr), RequestType::ThreadTldr);
        assert_eq!(RequestType::from(Action::Eli5), RequestType::Eli5);
    }

    #[test]
    fn test_unknown_type_falls_back_to_translation() {
        let prompt = RequestType::parse("shout").prompt("hola");
        assert_eq!(prompt, "Translate the following text to English:\n\nhola");
    }

    #[test]
    fn test_thread_input_is_truncated() {
        let text = "é".repeat(THREAD_INPUT_LIMIT + 500);
        let prompt = RequestType::ThreadSummary.prompt(&text);
        let input = prompt.rsplit("\n\n").next().unwrap();
        assert_eq!(input.chars().count(), THREAD_INPUT_LIMIT);
        assert!(prompt.starts_with("Create a comprehensive TL;DR summary of this entire Reddit thread"));

        let short = RequestType::Tldr.prompt(&text);
        assert!(short.ends_with(&text));
    }

    #[test]
    fn test_serde_as_string() {
        let t: RequestType = serde_json::from_str("\"thread-tldr\"").unwrap();
        assert_eq!(t, RequestType::ThreadTldr);
        assert_eq!(serde_json::to_string(&RequestType::Eli5).unwrap(), "\"eli5\"");
    }
}
