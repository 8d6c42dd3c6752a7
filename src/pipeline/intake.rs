//! Upload intake: persist an uploaded artifact to a private temporary file.
//!
//! The artifact is written to a [`NamedTempFile`] inside the configured
//! upload directory. The file gets a random name, so concurrent uploads of
//! `report.pdf` never collide, and it is deleted when the owning
//! [`UploadedArtifact`] is dropped, even if the run is abandoned half way
//! (client disconnect, panic). [`UploadedArtifact::release`] deletes it
//! explicitly so the analyzer can report the `Cleaned` stage.

use crate::error::AnalysisError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// One temporary uploaded file, owned by exactly one run.
#[derive(Debug)]
pub struct UploadedArtifact {
    original_filename: String,
    file: NamedTempFile,
}

impl UploadedArtifact {
    /// Filename as supplied by the client.
    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    /// Location of the temporary copy.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the temporary file now.
    ///
    /// A failed deletion is logged and otherwise ignored: the run has already
    /// produced its answer and `NamedTempFile` has given up the path.
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => debug!("Removed temporary upload {}", path.display()),
            Err(e) => warn!("Failed to remove temporary upload {}: {}", path.display(), e),
        }
    }
}

/// Everything one run of the pipeline consumes.
#[derive(Debug, Default)]
pub struct AnalysisRequest {
    /// Free-text question. Whitespace-only text counts as absent.
    pub query: Option<String>,
    /// The uploaded file, if any.
    pub artifact: Option<UploadedArtifact>,
}

impl AnalysisRequest {
    /// A request carrying only a question.
    pub fn query_only(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            artifact: None,
        }
    }

    /// The query, trimmed, or `None` when absent or blank.
    pub fn effective_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Lower-cased extension of the final path component, without the dot.
///
/// Dotfiles such as `.pdf` have no extension.
pub fn declared_extension(original_filename: &str) -> Option<String> {
    // Browsers on Windows sometimes send full paths.
    let base = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);
    Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// Write `bytes` to a uniquely named file in `upload_dir`.
///
/// The directory is created if it does not exist.
pub fn persist_upload(
    upload_dir: &Path,
    original_filename: &str,
    bytes: &[u8],
) -> Result<UploadedArtifact, AnalysisError> {
    let intake_err = |source: std::io::Error| AnalysisError::Intake {
        dir: upload_dir.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(upload_dir).map_err(intake_err)?;

    let suffix = declared_extension(original_filename)
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile_in(upload_dir)
        .map_err(intake_err)?;
    file.write_all(bytes).map_err(intake_err)?;
    file.flush().map_err(intake_err)?;

    debug!(
        "Stored upload '{}' ({} bytes) at {}",
        original_filename,
        bytes.len(),
        file.path().display()
    );

    Ok(UploadedArtifact {
        original_filename: original_filename.to_string(),
        file,
    })
}
