//! The analysis orchestrator.
//!
//! [`Analyzer::analyze`] drives one request through every pipeline stage and
//! owns the cleanup guarantee: the uploaded artifact is moved into the run,
//! the inner stages only borrow it, and it is released after they return,
//! whatever they returned. If the run future itself is dropped (client gone,
//! server shutting down) the artifact's `Drop` removes the file instead.

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, AnalyzerError, InferenceError};
use crate::lifecycle::{NoopObserver, Observer, Stage};
use crate::pipeline::classify::{classify, ExtractionStrategy};
use crate::pipeline::extract::{extract_image, extract_pdf};
use crate::pipeline::intake::{persist_upload, AnalysisRequest, UploadedArtifact};
use crate::pipeline::llm::{InferenceClient, LlmInferenceClient};
use crate::pipeline::postprocess::normalize_response;
use crate::pipeline::prompt::{build_prompt, ModelPrompt, PromptBounds};
use crate::prompts::SYSTEM_PROMPT_VERSION;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Sanitized HTML: the only thing a caller ever receives from a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedResult {
    html: String,
}

impl SanitizedResult {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }
}

/// Runs analysis requests. Immutable once built; share it as `Arc<Analyzer>`.
pub struct Analyzer {
    config: Arc<AnalyzerConfig>,
    client: Arc<dyn InferenceClient>,
    observer: Observer,
}

impl Analyzer {
    /// Build an analyzer around an existing inference client.
    pub fn new(config: AnalyzerConfig, client: Arc<dyn InferenceClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Build an analyzer whose client talks to the configured provider.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let client = LlmInferenceClient::from_config(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Report stage transitions to `observer`.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Persist an upload into the configured upload directory.
    pub fn intake(
        &self,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<UploadedArtifact, AnalysisError> {
        persist_upload(&self.config.upload_dir, original_filename, bytes)
    }

    /// Analyze one request.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<SanitizedResult, AnalysisError> {
        self.analyze_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Analyze one request, aborting the inference call if `cancel` fires.
    ///
    /// A cancelled run still goes through cleanup and returns
    /// [`InferenceError::Cancelled`].
    pub async fn analyze_with_cancel(
        &self,
        request: AnalysisRequest,
        cancel: CancellationToken,
    ) -> Result<SanitizedResult, AnalysisError> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("analyze", request_id = %request_id);
        self.run(request, cancel, &request_id).instrument(span).await
    }

    async fn run(
        &self,
        mut request: AnalysisRequest,
        cancel: CancellationToken,
        request_id: &str,
    ) -> Result<SanitizedResult, AnalysisError> {
        let start = Instant::now();
        self.transition(request_id, Stage::Received);

        let artifact = request.artifact.take();
        let outcome = self
            .process(artifact.as_ref(), request.effective_query(), &cancel, request_id)
            .await;

        if let Err(ref e) = outcome {
            self.transition(request_id, Stage::Failed(e.kind()));
            error!("Analysis failed: {}", e);
        }

        if let Some(artifact) = artifact {
            artifact.release();
        }
        self.transition(request_id, Stage::Cleaned);
        self.transition(request_id, Stage::Responded);

        info!(
            "Analysis {} in {}ms",
            if outcome.is_ok() { "succeeded" } else { "failed" },
            start.elapsed().as_millis()
        );
        outcome
    }

    /// Classify → extract → prompt → infer → normalize.
    async fn process(
        &self,
        artifact: Option<&UploadedArtifact>,
        query: Option<&str>,
        cancel: &CancellationToken,
        request_id: &str,
    ) -> Result<SanitizedResult, AnalysisError> {
        let strategy = classify(artifact.map(UploadedArtifact::original_filename));
        debug!("Strategy: {:?}", strategy);
        self.transition(request_id, Stage::Classified);

        let content = match (strategy, artifact) {
            (ExtractionStrategy::Unsupported(extension), _) => {
                return Err(AnalysisError::UnsupportedFileType {
                    extension: extension.unwrap_or_default(),
                });
            }
            (ExtractionStrategy::Image(mime_type), Some(a)) => {
                Some(extract_image(a.path(), mime_type).await?)
            }
            (ExtractionStrategy::Pdf, Some(a)) => Some(extract_pdf(a.path()).await?),
            (ExtractionStrategy::NoArtifact, _) | (_, None) => None,
        };
        if content.is_some() {
            self.transition(request_id, Stage::Extracted);
        }

        let bounds = PromptBounds {
            max_report_chars: self.config.max_report_chars,
            max_query_chars: self.config.max_query_chars,
        };
        let prompt = build_prompt(content, query, bounds)?;
        debug!(
            "Prompt v{} for {:?} model: {} parts",
            SYSTEM_PROMPT_VERSION,
            prompt.model(),
            prompt.parts().len()
        );
        self.transition(request_id, Stage::Prompted);

        let raw = self.infer(&prompt, cancel).await?;
        self.transition(request_id, Stage::Inferred);

        let html = normalize_response(&raw)?;
        self.transition(request_id, Stage::Normalized);

        Ok(SanitizedResult { html })
    }

    /// The run's single suspension point: deadline + cancellation.
    async fn infer(
        &self,
        prompt: &ModelPrompt,
        cancel: &CancellationToken,
    ) -> Result<String, InferenceError> {
        let secs = self.config.api_timeout_secs;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(InferenceError::Cancelled),
            res = tokio::time::timeout(Duration::from_secs(secs), self.client.generate(prompt)) => {
                res.unwrap_or(Err(InferenceError::Timeout { secs }))
            }
        }
    }

    fn transition(&self, request_id: &str, stage: Stage) {
        debug!("→ {}", stage);
        self.observer.on_stage(request_id, stage);
    }
}
