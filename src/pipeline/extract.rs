//! Content extraction: turn a temporary artifact into something a model reads.
//!
//! * Images are passed through untouched: the bytes are base64-encoded and
//!   paired with the MIME type the router chose. Vision APIs accept inline
//!   base64 data, so there is no decoding or re-encoding step.
//! * PDFs are reduced to their text layer with `pdf-extract`. Layout and
//!   embedded images are discarded. Parsing is CPU-bound and the library is
//!   known to panic on some malformed files, so it runs on the blocking pool
//!   behind `catch_unwind`.

use crate::error::ExtractionCause;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

/// Analyzable content produced from one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedContent {
    /// Base64-encoded image bytes and their MIME type.
    ImagePayload { data: String, mime_type: String },
    /// Plain text from a document.
    TextPayload(String),
}

/// Read an image and wrap it as a base64 payload.
pub async fn extract_image(
    path: &Path,
    mime_type: &str,
) -> Result<ExtractedContent, ExtractionCause> {
    let bytes = tokio::fs::read(path).await?;
    let data = STANDARD.encode(&bytes);
    debug!("Encoded image {} → {} bytes base64", path.display(), data.len());

    Ok(ExtractedContent::ImagePayload {
        data,
        mime_type: mime_type.to_string(),
    })
}

/// Read a PDF and extract its plain text.
pub async fn extract_pdf(path: &Path) -> Result<ExtractedContent, ExtractionCause> {
    let bytes = tokio::fs::read(path).await?;
    let text = tokio::task::spawn_blocking(move || pdf_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractionCause::Parse(format!("extraction task failed: {e}")))??;

    debug!("Extracted {} chars of text from {}", text.len(), path.display());
    Ok(ExtractedContent::TextPayload(text))
}

/// Extract text from PDF bytes held in memory.
///
/// Returns [`ExtractionCause::Parse`] for malformed input, for a panic inside
/// the parser, and for a document without any text layer.
pub fn pdf_text_from_mem(bytes: &[u8]) -> Result<String, ExtractionCause> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    let text = match outcome {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(ExtractionCause::Parse(e.to_string())),
        Err(_) => return Err(ExtractionCause::Parse("PDF parser panicked".into())),
    };

    if text.trim().is_empty() {
        return Err(ExtractionCause::Parse(
            "document has no extractable text".into(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn image_is_base64_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let content = extract_image(&path, "image/png").await.unwrap();
        match content {
            ExtractedContent::ImagePayload { data, mime_type } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(STANDARD.decode(data).unwrap(), vec![0x89, b'P', b'N', b'G']);
            }
            other => panic!("expected image payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_image_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_image(&dir.path().join("gone.jpg"), "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionCause::Io(_)));
    }

    #[test]
    fn garbage_pdf_is_parse_error() {
        let err = pdf_text_from_mem(b"%PDF-1.4\nthis is not really a pdf").unwrap_err();
        assert!(matches!(err, ExtractionCause::Parse(_)));
    }

    #[test]
    fn empty_bytes_is_parse_error() {
        assert!(matches!(
            pdf_text_from_mem(b"").unwrap_err(),
            ExtractionCause::Parse(_)
        ));
    }
}
