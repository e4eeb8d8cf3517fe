//! Text helpers: body extraction, degraded summaries and thread documents

use crate::dom::Dom;
use crate::profile::HostProfile;

/// Comments included in a thread document.
pub const MAX_THREAD_COMMENTS: usize = 50;
/// A comment body must be longer than this (in characters) to be included.
pub const MIN_COMMENT_CHARS: usize = 20;
/// Sentences at or below this many non-whitespace characters are dropped
/// from a degraded summary.
pub const MIN_SENTENCE_CHARS: usize = 10;
/// Sentences kept in a degraded summary.
pub const SUMMARY_SENTENCES: usize = 3;

/// Body text of a post or comment.
///
/// Probes the profile's body chain in priority order and falls back to the
/// element's full text. The result is trimmed.
pub fn extract_body_text<D: Dom>(dom: &D, profile: &HostProfile, element: &D::Element) -> String {
    let source = profile
        .body
        .first_match(dom, element)
        .unwrap_or_else(|| element.clone());
    dom.text_content(&source).trim().to_string()
}

/// Local stand-in for a failed tldr request.
///
/// Splits on runs of sentence terminators, keeps sentences with more than
/// [`MIN_SENTENCE_CHARS`] non-whitespace characters, takes the first
/// [`SUMMARY_SENTENCES`] of them and joins with `". "` plus a final period.
/// Text with no qualifying sentence yields a lone `"."`.
pub fn degraded_summary(text: &str) -> String {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().filter(|c| !c.is_whitespace()).count() > MIN_SENTENCE_CHARS)
        .take(SUMMARY_SENTENCES)
        .collect();

    let mut summary = sentences.join(". ");
    summary.push('.');
    summary
}

/// Post body plus qualifying comment bodies, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThreadDocument {
    pub post: String,
    pub comments: Vec<String>,
}

impl ThreadDocument {
    /// Collect the primary post and up to [`MAX_THREAD_COMMENTS`] comments
    /// longer than [`MIN_COMMENT_CHARS`].
    pub fn collect<D: Dom>(dom: &D, profile: &HostProfile) -> Self {
        let root = dom.document_element();

        let post = dom
            .query(&root, &profile.post)
            .map(|post| extract_body_text(dom, profile, &post))
            .unwrap_or_default();

        let comments = Self::select_comments(
            dom.query_all(&root, &profile.comment)
                .iter()
                .map(|comment| extract_body_text(dom, profile, comment)),
        );

        Self { post, comments }
    }

    /// Apply the length filter and the count cap to trimmed comment bodies.
    pub fn select_comments(bodies: impl IntoIterator<Item = String>) -> Vec<String> {
        bodies
            .into_iter()
            .map(|body| body.trim().to_string())
            .filter(|body| body.chars().count() > MIN_COMMENT_CHARS)
            .take(MAX_THREAD_COMMENTS)
            .collect()
    }

    /// Single request payload.
    pub fn render(&self) -> String {
        format!("Post: {}\n\nComments:\n{}", self.post, self.comments.join("\n\n"))
    }
}
