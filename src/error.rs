//! Error types for the medlens library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AnalyzerError`]: **Startup**. The service cannot be assembled at all
//!   (invalid configuration, provider not configured). Returned once, before
//!   any request is served.
//!
//! * [`AnalysisError`]: **Per request**. One run of the pipeline failed. The
//!   detail is logged with the request id and the caller only ever sees a
//!   generic failure message (see [`crate::server`]).

use crate::lifecycle::FailureKind;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while building an [`crate::Analyzer`].
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },
}

/// Why an artifact could not be turned into analyzable content.
#[derive(Debug, Error)]
pub enum ExtractionCause {
    /// The temporary file could not be read.
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    /// The PDF could not be parsed, or yielded no text.
    #[error("failed to parse PDF: {0}")]
    Parse(String),
}

/// Failure of the single external inference call.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The provider returned an error (network, quota, auth, bad response).
    #[error("provider call failed: {0}")]
    Provider(String),

    /// The call exceeded the configured deadline.
    #[error("provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The run was cancelled while waiting on the provider.
    #[error("provider call cancelled")]
    Cancelled,
}

/// Every way a single analysis run can fail.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Neither an artifact nor a non-empty query was supplied.
    #[error("request has no artifact and no query")]
    Validation,

    /// The uploaded artifact's extension is not an image or PDF.
    #[error("unsupported file type '{extension}'")]
    UnsupportedFileType { extension: String },

    /// The upload could not be persisted to the temporary directory.
    #[error("failed to store upload in '{dir}': {source}")]
    Intake {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact was unreadable or unparseable.
    #[error("extraction failed: {cause}")]
    Extraction {
        #[source]
        cause: ExtractionCause,
    },

    /// The external model call failed.
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    /// Sanitized output did not settle within the sanitizer's pass limit.
    #[error("sanitization failed: {0}")]
    Sanitization(String),
}

impl AnalysisError {
    /// The state-machine label for this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            AnalysisError::Validation => FailureKind::Validation,
            AnalysisError::UnsupportedFileType { .. } => FailureKind::UnsupportedFileType,
            AnalysisError::Intake { .. } => FailureKind::Intake,
            AnalysisError::Extraction { .. } => FailureKind::Extraction,
            AnalysisError::Inference(_) => FailureKind::Inference,
            AnalysisError::Sanitization(_) => FailureKind::Sanitization,
        }
    }
}

impl From<ExtractionCause> for AnalysisError {
    fn from(cause: ExtractionCause) -> Self {
        AnalysisError::Extraction { cause }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_display_names_extension() {
        let e = AnalysisError::UnsupportedFileType {
            extension: "txt".into(),
        };
        assert!(e.to_string().contains("'txt'"), "got: {e}");
    }

    #[test]
    fn timeout_display() {
        let e = AnalysisError::from(InferenceError::Timeout { secs: 60 });
        assert!(e.to_string().contains("60s"));
        assert_eq!(e.kind(), FailureKind::Inference);
    }

    #[test]
    fn extraction_cause_converts() {
        let e: AnalysisError = ExtractionCause::Parse("bad xref".into()).into();
        assert_eq!(e.kind(), FailureKind::Extraction);
        assert!(e.to_string().contains("bad xref"));
    }

    #[test]
    fn provider_not_configured_display() {
        let e = AnalyzerError::ProviderNotConfigured {
            provider: "gemini".into(),
            hint: "set GEMINI_API_KEY".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }
}
