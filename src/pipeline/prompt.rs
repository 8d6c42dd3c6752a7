//! Prompt assembly: system instruction + extracted content → [`ModelPrompt`].
//!
//! The prompt is a single ordered list of content parts. For images the
//! picture comes first and the instruction text second; everything else is a
//! single text part. The instruction is concatenated into the text part
//! rather than sent as a separate system turn, so the same prompt shape works
//! for every provider.

use crate::error::AnalysisError;
use crate::pipeline::extract::ExtractedContent;
use crate::prompts::{with_system_prompt, DEFAULT_IMAGE_QUERY, REPORT_PREAMBLE};
use tracing::warn;

/// Which of the two configured models a prompt targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Vision-capable model; images only.
    Vision,
    /// Text-only model; PDF reports and plain questions.
    Text,
}

/// One unit of a multimodal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Inline base64 image.
    Image { data: String, mime_type: String },
    /// Plain text.
    Text(String),
}

/// The complete, immutable input to one inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPrompt {
    model: ModelKind,
    parts: Vec<ContentPart>,
}

impl ModelPrompt {
    pub fn model(&self) -> ModelKind {
        self.model
    }

    pub fn parts(&self) -> &[ContentPart] {
        &self.parts
    }

    /// All text parts joined by blank lines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Character limits applied while building a prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptBounds {
    pub max_report_chars: usize,
    pub max_query_chars: usize,
}

/// Build the prompt for one run.
///
/// * `content` is `None` for query-only runs.
/// * `query` must already be trimmed; `None` means no usable query.
///
/// A query-only run without a query is rejected here, before any external
/// call is made.
pub fn build_prompt(
    content: Option<ExtractedContent>,
    query: Option<&str>,
    bounds: PromptBounds,
) -> Result<ModelPrompt, AnalysisError> {
    let query = query.map(|q| truncate_chars(q, bounds.max_query_chars, "query"));

    let prompt = match content {
        Some(ExtractedContent::ImagePayload { data, mime_type }) => {
            let query = query.unwrap_or(DEFAULT_IMAGE_QUERY);
            ModelPrompt {
                model: ModelKind::Vision,
                parts: vec![
                    ContentPart::Image { data, mime_type },
                    ContentPart::Text(with_system_prompt(query)),
                ],
            }
        }
        Some(ExtractedContent::TextPayload(text)) => {
            let report = truncate_chars(&text, bounds.max_report_chars, "report");
            ModelPrompt {
                model: ModelKind::Text,
                parts: vec![ContentPart::Text(with_system_prompt(&format!(
                    "{REPORT_PREAMBLE}{report}"
                )))],
            }
        }
        None => {
            let query = query.ok_or(AnalysisError::Validation)?;
            ModelPrompt {
                model: ModelKind::Text,
                parts: vec![ContentPart::Text(with_system_prompt(query))],
            }
        }
    };

    Ok(prompt)
}

/// Cut `s` to at most `max` characters on a char boundary.
fn truncate_chars<'a>(s: &'a str, max: usize, what: &str) -> &'a str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => {
            warn!("Truncating {} from {} to {} chars", what, s.chars().count(), max);
            &s[..idx]
        }
        None => s,
    }
}
