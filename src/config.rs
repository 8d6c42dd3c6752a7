//! Configuration for the analysis service.
//!
//! All service behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`]. The config is read once at startup and then
//! shared immutably by every request; nothing in the request path reads the
//! environment.

use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default vision-capable model, used only for image uploads.
pub const DEFAULT_VISION_MODEL: &str = "gemini-1.5-pro";

/// Default text-only model, used for PDF reports and plain questions.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";

/// Default provider name passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Configuration for an [`crate::Analyzer`] and its HTTP front end.
///
/// # Example
/// ```rust
/// use medlens::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .text_model("gemini-2.0-flash")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.text_model, "gemini-2.0-flash");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Provider name understood by `ProviderFactory`. Default: "gemini".
    pub provider_name: String,

    /// Model receiving image uploads. Default: [`DEFAULT_VISION_MODEL`].
    pub vision_model: String,

    /// Model receiving PDF text and plain questions. Default: [`DEFAULT_TEXT_MODEL`].
    pub text_model: String,

    /// Sampling temperature. Range 0.0–2.0. Default: 0.4.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: usize,

    /// Deadline for the inference call in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Directory receiving temporary uploads. Created on first use.
    pub upload_dir: PathBuf,

    /// Largest accepted request body in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// PDF text beyond this many characters is cut. Default: 100 000.
    pub max_report_chars: usize,

    /// User queries beyond this many characters are cut. Default: 4 000.
    pub max_query_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            temperature: 0.4,
            max_tokens: 4096,
            api_timeout_secs: 60,
            upload_dir: std::env::temp_dir().join("medlens-uploads"),
            max_upload_bytes: 20 * 1024 * 1024,
            max_report_chars: 100_000,
            max_query_chars: 4_000,
        }
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.config.vision_model = model.into();
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn max_report_chars(mut self, n: usize) -> Self {
        self.config.max_report_chars = n;
        self
    }

    pub fn max_query_chars(mut self, n: usize) -> Self {
        self.config.max_query_chars = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzerError> {
        let c = &self.config;
        if c.provider_name.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "provider name must not be empty".into(),
            ));
        }
        if c.vision_model.trim().is_empty() || c.text_model.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "model names must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.max_report_chars == 0 || c.max_query_chars == 0 {
            return Err(AnalyzerError::InvalidConfig(format!(
                "prompt bounds must be positive, got report={} query={}",
                c.max_report_chars, c.max_query_chars
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.provider_name, "gemini");
        assert_eq!(c.vision_model, "gemini-1.5-pro");
        assert_eq!(c.text_model, "gemini-1.5-flash");
        assert_eq!(c.api_timeout_secs, 60);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = AnalyzerConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = AnalyzerConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidConfig(_)));
    }

    #[test]
    fn blank_model_rejected() {
        let err = AnalyzerConfig::builder().vision_model("  ").build().unwrap_err();
        assert!(err.to_string().contains("model names"));
    }
}
