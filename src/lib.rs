//! # medlens
//!
//! Analyze a medical image, a PDF health report, or a plain health question
//! with a generative model, and return the answer as sanitized HTML.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (+ query)
//!  │
//!  ├─ 1. Intake     persist the upload to a unique temp file (owned by the run)
//!  ├─ 2. Classify   .jpg/.jpeg/.png → image, .pdf → report, else unsupported
//!  ├─ 3. Extract    image → base64, PDF → text layer (spawn_blocking)
//!  ├─ 4. Prompt     versioned system instruction + content parts
//!  ├─ 5. Infer      one call: vision model for images, text model otherwise
//!  ├─ 6. Normalize  **bold** / paragraphs / breaks → HTML → allow-list sanitizer
//!  └─ 7. Cleanup    temp file removed on every path, then reply
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use medlens::{AnalysisRequest, Analyzer, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider credentials come from GEMINI_API_KEY.
//!     let analyzer = Analyzer::from_config(AnalyzerConfig::default())?;
//!
//!     let bytes = std::fs::read("blood-work.pdf")?;
//!     let artifact = analyzer.intake("blood-work.pdf", &bytes)?;
//!     let request = AnalysisRequest { query: None, artifact: Some(artifact) };
//!
//!     let html = analyzer.analyze(request).await?;
//!     println!("{}", html.as_str());
//!     Ok(())
//! }
//! ```
//!
//! ## Serving over HTTP
//!
//! [`server::router`] wraps an `Arc<Analyzer>` in an axum `Router` exposing
//! `POST /analyze` (multipart `file` + `query`). The `medlens-server` binary
//! (feature `cli`, on by default) does exactly that.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `medlens-server` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{Analyzer, SanitizedResult};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use error::{AnalysisError, AnalyzerError, ExtractionCause, InferenceError};
pub use lifecycle::{FailureKind, NoopObserver, Observer, Stage, StageObserver};
pub use pipeline::classify::{classify, ExtractionStrategy};
pub use pipeline::extract::ExtractedContent;
pub use pipeline::intake::{AnalysisRequest, UploadedArtifact};
pub use pipeline::llm::{InferenceClient, LlmInferenceClient};
pub use pipeline::prompt::{ContentPart, ModelKind, ModelPrompt};
pub use tokio_util::sync::CancellationToken;
