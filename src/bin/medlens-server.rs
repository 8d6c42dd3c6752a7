//! HTTP server binary for medlens.
//!
//! A thin shim over the library crate that maps CLI flags (with environment
//! fallbacks) to `AnalyzerConfig`, builds the providers once, and serves the
//! router until Ctrl-C.

use anyhow::{bail, Context, Result};
use clap::Parser;
use medlens::{server, Analyzer, AnalyzerConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default port (4000)
  GEMINI_API_KEY=... medlens-server

  # Ask a question
  curl -F query="What causes headaches?" http://localhost:4000/analyze

  # Analyze a report
  curl -F file=@blood-work.pdf http://localhost:4000/analyze

  # Analyze an X-ray with a question
  curl -F file=@xray.png -F query="Is there a fracture?" http://localhost:4000/analyze

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (required for the default provider)
  PORT                    Listen port
  RUST_LOG                tracing filter, overrides --verbose / --quiet
"#;

/// Serve medical image and report analysis over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "medlens-server",
    version,
    about = "Serve medical image and report analysis over HTTP",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "MEDLENS_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 4000)]
    port: u16,

    /// LLM provider name.
    #[arg(long, env = "MEDLENS_PROVIDER", default_value = medlens::config::DEFAULT_PROVIDER)]
    provider: String,

    /// Vision-capable model used for image uploads.
    #[arg(long, env = "MEDLENS_VISION_MODEL", default_value = medlens::config::DEFAULT_VISION_MODEL)]
    vision_model: String,

    /// Text model used for PDF reports and questions.
    #[arg(long, env = "MEDLENS_TEXT_MODEL", default_value = medlens::config::DEFAULT_TEXT_MODEL)]
    text_model: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "MEDLENS_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "MEDLENS_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Inference call timeout in seconds.
    #[arg(long, env = "MEDLENS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Directory for temporary uploads. Default: <tmp>/medlens-uploads.
    #[arg(long, env = "MEDLENS_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "MEDLENS_MAX_UPLOAD_MB", default_value_t = 20)]
    max_upload_mb: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MEDLENS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MEDLENS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    info!(
        "Models: vision={} text={} (provider {})",
        config.vision_model, config.text_model, config.provider_name
    );

    // ── Providers ────────────────────────────────────────────────────────
    let analyzer = Arc::new(
        Analyzer::from_config(config).context("Failed to initialise the LLM provider")?,
    );

    // ── Serve ────────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", cli.host, cli.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    server::serve(listener, analyzer, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Map CLI flags onto an [`AnalyzerConfig`].
fn build_config(cli: &Cli) -> Result<AnalyzerConfig> {
    // The provider factory reads the key itself; fail here with a clear message.
    if cli.provider == medlens::config::DEFAULT_PROVIDER {
        let key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if key.trim().is_empty() {
            bail!("GEMINI_API_KEY is not set.\nExport it before starting the server.");
        }
    }

    let mut builder = AnalyzerConfig::builder()
        .provider_name(&cli.provider)
        .vision_model(&cli.vision_model)
        .text_model(&cli.text_model)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .max_upload_bytes(cli.max_upload_mb.saturating_mul(1024 * 1024));

    if let Some(ref dir) = cli.upload_dir {
        builder = builder.upload_dir(dir);
    }

    builder.build().context("Invalid configuration")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
