//! Type routing: map an upload's declared extension to an extraction strategy.
//!
//! Pure and total: no filesystem access, no I/O. The returned enum is closed
//! so every consumer handles every case with an exhaustive `match`.

use crate::pipeline::intake::declared_extension;

/// How content is retrieved from the uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Send the raw image to the vision model with this MIME type.
    Image(&'static str),
    /// Extract the text layer and send it to the text model.
    Pdf,
    /// An artifact is present but its type is not supported.
    Unsupported(Option<String>),
    /// No artifact; the query alone is analysed.
    NoArtifact,
}

/// Classify an upload by its original filename.
///
/// `None` means no artifact was uploaded.
pub fn classify(original_filename: Option<&str>) -> ExtractionStrategy {
    let Some(name) = original_filename else {
        return ExtractionStrategy::NoArtifact;
    };

    let extension = declared_extension(name);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => ExtractionStrategy::Image("image/jpeg"),
        Some("png") => ExtractionStrategy::Image("image/png"),
        Some("pdf") => ExtractionStrategy::Pdf,
        _ => ExtractionStrategy::Unsupported(extension),
    }
}
