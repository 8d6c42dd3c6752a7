//! Model interaction: send a [`ModelPrompt`] to the right provider.
//!
//! [`InferenceClient`] is the seam between the pipeline and the outside world.
//! The analyzer only ever talks to this trait, so tests substitute a
//! recording fake and never touch the network.
//!
//! The production implementation, [`LlmInferenceClient`], holds two
//! `edgequake_llm` providers created once at startup: one for the vision
//! model and one for the text model. There is no retry loop; a failed call
//! fails the run.

use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, InferenceError};
use crate::pipeline::prompt::{ContentPart, ModelKind, ModelPrompt};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Anything that can turn a prompt into generated text.
///
/// Implementations must buffer the full response; the pipeline has no use
/// for partial output.
pub trait InferenceClient: Send + Sync {
    /// Run one inference call for `prompt`.
    fn generate<'a>(&'a self, prompt: &'a ModelPrompt)
        -> BoxFuture<'a, Result<String, InferenceError>>;
}

/// [`InferenceClient`] backed by `edgequake_llm` providers.
pub struct LlmInferenceClient {
    vision: Arc<dyn LLMProvider>,
    text: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmInferenceClient {
    /// Wrap already-constructed providers.
    pub fn new(
        vision: Arc<dyn LLMProvider>,
        text: Arc<dyn LLMProvider>,
        config: &AnalyzerConfig,
    ) -> Self {
        Self {
            vision,
            text,
            options: build_options(config),
        }
    }

    /// Create both providers through [`ProviderFactory`].
    ///
    /// The factory reads the provider's API key (`GEMINI_API_KEY` for the
    /// default provider) from the environment.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let vision = create_provider(&config.provider_name, &config.vision_model)?;
        let text = create_provider(&config.provider_name, &config.text_model)?;
        Ok(Self::new(vision, text, config))
    }

    fn provider(&self, kind: ModelKind) -> &Arc<dyn LLMProvider> {
        match kind {
            ModelKind::Vision => &self.vision,
            ModelKind::Text => &self.text,
        }
    }
}

impl InferenceClient for LlmInferenceClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a ModelPrompt,
    ) -> BoxFuture<'a, Result<String, InferenceError>> {
        Box::pin(async move {
            let start = Instant::now();
            let messages = to_messages(prompt);
            let response = self
                .provider(prompt.model())
                .chat(&messages, Some(&self.options))
                .await
                .map_err(|e| InferenceError::Provider(e.to_string()))?;

            debug!(
                "{:?} model: {} input tokens, {} output tokens, {:?}",
                prompt.model(),
                response.prompt_tokens,
                response.completion_tokens,
                start.elapsed()
            );
            Ok(response.content)
        })
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, AnalyzerError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AnalyzerError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("model '{model}': {e}"),
        }
    })
}

/// Convert the prompt into a single user turn.
///
/// Images ride along as attachments of that turn; text parts are joined.
fn to_messages(prompt: &ModelPrompt) -> Vec<ChatMessage> {
    let images: Vec<ImageData> = prompt
        .parts()
        .iter()
        .filter_map(|p| match p {
            ContentPart::Image { data, mime_type } => {
                Some(ImageData::new(data.clone(), mime_type.as_str()))
            }
            ContentPart::Text(_) => None,
        })
        .collect();
    let text = prompt.text();

    if images.is_empty() {
        vec![ChatMessage::user(text.as_str())]
    } else {
        vec![ChatMessage::user_with_images(text.as_str(), images)]
    }
}

/// Build `CompletionOptions` from the analyzer config.
fn build_options(config: &AnalyzerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
