//! Post-processing: model markdown → restricted, sanitized HTML.
//!
//! The model answers in a small markdown subset (bold, blank-line paragraphs,
//! line breaks). This module turns that subset into HTML and then runs the
//! result through an allow-list sanitizer. Nothing model-derived reaches the
//! caller without passing through [`normalize_response`].
//!
//! ## Rule Order
//!
//! 1. Strip an outer markdown fence (models sometimes wrap the whole answer)
//! 2. Normalise line endings (CRLF / CR → LF)
//! 3. `**X**` → `<strong>X</strong>`
//! 4. blank line → `<br><br>`
//! 5. remaining newline → `<br>`
//! 6. Sanitize against the allow-list
//!
//! Bold must run before the newline rules so a `**` pair split across lines
//! is left alone, and the double-newline rule must run before the single one.

use crate::error::AnalysisError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Tags that survive sanitisation: a conservative default set plus `img`.
pub const ALLOWED_TAGS: &[&str] = &[
    "address", "article", "aside", "footer", "header", "h1", "h2", "h3", "h4", "h5", "h6",
    "hgroup", "main", "nav", "section", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "hr", "li", "ol", "p", "pre", "ul", "a", "abbr", "b", "bdi", "bdo", "br", "cite",
    "code", "data", "dfn", "em", "i", "kbd", "mark", "q", "rb", "rp", "rt", "rtc", "ruby", "s",
    "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr", "caption", "col",
    "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "img",
];

/// The only attribute allowed, on any tag.
pub const ALLOWED_ATTRIBUTE: &str = "style";

/// Elements removed together with everything inside them.
const STRIPPED_CONTENT_TAGS: &[&str] = &["script", "style", "textarea", "option", "noscript"];

/// Upper bound on cleaning passes in [`sanitize_html`].
///
/// The HTML parser drops the first newline after `<pre>` on every parse, so
/// `<pre>` text that starts with N newlines needs N + 1 passes to settle.
pub const MAX_SANITIZE_PASSES: usize = 8;

/// Convert model output to sanitized HTML.
///
/// Fails only if the sanitizer's output is not a fixed point of itself,
/// i.e. the markup did not settle within [`MAX_SANITIZE_PASSES`].
pub fn normalize_response(raw: &str) -> Result<String, AnalysisError> {
    let html = markdown_to_html(raw);
    let safe = sanitize_html(&html);

    let again = clean_once(&safe);
    if again != safe {
        return Err(AnalysisError::Sanitization(format!(
            "output still changing after {} passes ({} → {} bytes)",
            MAX_SANITIZE_PASSES,
            safe.len(),
            again.len()
        )));
    }
    Ok(safe)
}

/// Apply rules 1–5: the markdown subset to (unsanitized) HTML.
pub fn markdown_to_html(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = bold_to_strong(&s);
    s.replace("\n\n", "<br><br>").replace('\n', "<br>")
}

/// Rule 6: keep only allow-listed tags and the `style` attribute.
///
/// Cleans repeatedly until the output stops changing, so
/// `sanitize_html(&sanitize_html(x)) == sanitize_html(x)` for any input that
/// settles within [`MAX_SANITIZE_PASSES`].
pub fn sanitize_html(html: &str) -> String {
    let mut current = clean_once(html);
    for _ in 1..MAX_SANITIZE_PASSES {
        let next = clean_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn clean_once(html: &str) -> String {
    let tags: HashSet<&str> = ALLOWED_TAGS.iter().copied().collect();
    let generic: HashSet<&str> = [ALLOWED_ATTRIBUTE].into_iter().collect();
    let stripped: HashSet<&str> = STRIPPED_CONTENT_TAGS.iter().copied().collect();

    ammonia::Builder::default()
        .tags(tags)
        .tag_attributes(HashMap::new())
        .generic_attributes(generic)
        .clean_content_tags(stripped)
        .link_rel(None)
        .strip_comments(true)
        .clean(html)
        .to_string()
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Bold ─────────────────────────────────────────────────────────────

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

fn bold_to_strong(input: &str) -> String {
    RE_BOLD.replace_all(input, "<strong>${1}</strong>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_and_paragraph_break() {
        let out = normalize_response("**Risk**\n\nSee a doctor").unwrap();
        assert_eq!(out, "<strong>Risk</strong><br><br>See a doctor");
    }

    #[test]
    fn single_newline_becomes_br() {
        assert_eq!(markdown_to_html("a\nb"), "a<br>b");
        assert_eq!(markdown_to_html("a\n\n\nb"), "a<br><br><br>b");
    }

    #[test]
    fn bold_is_non_greedy_and_single_line() {
        assert_eq!(
            markdown_to_html("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
        assert_eq!(markdown_to_html("**a\nb**"), "**a<br>b**");
    }

    #[test]
    fn crlf_is_normalised() {
        assert_eq!(markdown_to_html("a\r\n\r\nb\rc"), "a<br><br>b<br>c");
    }

    #[test]
    fn outer_fence_is_stripped() {
        assert_eq!(markdown_to_html("```markdown\n**Hi**\n```"), "<strong>Hi</strong>");
        // Inner code fences are not touched.
        assert_eq!(markdown_to_html("see\n```\nx\n```"), "see<br>```<br>x<br>```");
    }

    #[test]
    fn script_is_removed_with_content() {
        let out = sanitize_html("<p>ok</p><script>alert('x')</script>");
        assert_eq!(out, "<p>ok</p>");
        assert!(!out.contains("alert"));
    }

    #[test]
    fn only_style_attribute_survives() {
        let out = sanitize_html(r#"<p style="color:red" onclick="evil()" class="c">hi</p>"#);
        assert_eq!(out, r#"<p style="color:red">hi</p>"#);
    }

    #[test]
    fn links_lose_href_and_gain_no_rel() {
        let out = sanitize_html(r#"<a href="javascript:alert(1)">x</a>"#);
        assert_eq!(out, "<a>x</a>");
    }

    #[test]
    fn img_and_br_allowed() {
        let out = sanitize_html(r#"<img src="x.png" style="width:1px"><br>"#);
        assert_eq!(out, r#"<img style="width:1px"><br>"#);
    }

    #[test]
    fn unknown_tags_are_unwrapped() {
        assert_eq!(sanitize_html("<custom>text</custom>"), "text");
        assert_eq!(sanitize_html("<iframe src=x></iframe>after"), "after");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "",
            "plain text",
            "a < b && c > d",
            "<strong>Risk</strong><br><br>See a doctor",
            "<div><p style=\"x\">nested <em>deep</em></p></div>",
            "<script>x</script><style>p{}</style><!-- c -->done",
            "<table><tr><td>1</td></tr></table>",
            "<b><i>unclosed",
            "<img src=x onerror=alert(1)>",
            "&amp; &lt; &#39; \"quoted\"",
            "<pre>\n\nx</pre>",
            "<pre>&#10;&#10;&#10;code</pre>",
            "<textarea>\n\nt</textarea>",
        ];
        for s in samples {
            let once = sanitize_html(s);
            assert_eq!(sanitize_html(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn normalize_strips_injected_markup() {
        let out =
            normalize_response("**Note**\n<script>steal()</script>Drink water").unwrap();
        assert_eq!(out, "<strong>Note</strong><br>Drink water");
    }

    #[test]
    fn leading_pre_newlines_settle() {
        assert_eq!(sanitize_html("<pre>\n\nx</pre>"), "<pre>x</pre>");
        let out = normalize_response("<pre>&#10;&#10;x</pre>").unwrap();
        assert_eq!(out, "<pre>x</pre>");
    }

    #[test]
    fn non_text_elements_lose_their_content() {
        assert_eq!(sanitize_html("<noscript><p>x</p></noscript>after"), "after");
        assert_eq!(sanitize_html("<textarea>secret</textarea>after"), "after");
        assert_eq!(sanitize_html("<option>o</option>after"), "after");
    }

    #[test]
    fn unsettled_markup_is_rejected() {
        let raw = format!("<pre>{}x</pre>", "&#10;".repeat(MAX_SANITIZE_PASSES * 2));
        let err = normalize_response(&raw).unwrap_err();
        assert!(matches!(err, AnalysisError::Sanitization(_)));
    }
}
