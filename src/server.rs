//! HTTP boundary: one multipart endpoint in front of the [`Analyzer`].
//!
//! ```text
//! GET  /         → "API Working"
//! POST /analyze  → multipart { file?: binary, query?: text }
//!                  200 {"response": "<sanitized html>"}
//!                  500 {"error": "Failed to analyze the request."}
//! ```
//!
//! Every failure, whatever its cause, produces the same reply. The cause is
//! logged by the analyzer (or here, for failures before a run starts) and
//! never sent to the client.

use crate::analyze::Analyzer;
use crate::pipeline::intake::AnalysisRequest;
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// The message returned for every failed request.
pub const GENERIC_FAILURE: &str = "Failed to analyze the request.";

/// Successful reply body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub response: String,
}

/// Failure reply body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// The one error the boundary ever reports.
#[derive(Debug)]
pub struct AnalysisFailed;

impl IntoResponse for AnalysisFailed {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: GENERIC_FAILURE.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the service router.
pub fn router(analyzer: Arc<Analyzer>) -> Router {
    let body_limit = analyzer.config().max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(analyzer)
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    analyzer: Arc<Analyzer>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Analysis server listening");
    }
    axum::serve(listener, router(analyzer))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> &'static str {
    "API Working"
}

async fn analyze(
    State(analyzer): State<Arc<Analyzer>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AnalysisFailed> {
    let multipart = multipart.map_err(|e| {
        error!("Rejected analysis request: {}", e);
        AnalysisFailed
    })?;

    let form = read_form(multipart).await.map_err(|e| {
        error!("Malformed multipart body: {}", e);
        AnalysisFailed
    })?;

    let artifact = match form.file {
        Some((filename, bytes)) => Some(analyzer.intake(&filename, &bytes).map_err(|e| {
            error!("Upload intake failed: {}", e);
            AnalysisFailed
        })?),
        None => None,
    };

    let request = AnalysisRequest {
        query: form.query,
        artifact,
    };

    // The analyzer logs the cause with the request id.
    let result = analyzer.analyze(request).await.map_err(|_| AnalysisFailed)?;

    Ok(Json(AnalyzeResponse {
        response: result.into_string(),
    }))
}

/// The fields this endpoint cares about.
#[derive(Debug, Default)]
struct UploadForm {
    query: Option<String>,
    file: Option<(String, Bytes)>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "query" => {
                form.query = Some(field.text().await?);
            }
            "file" if form.file.is_none() => {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await?;
                // An empty file input: the browser sends no name and no bytes.
                if !(filename.is_empty() && bytes.is_empty()) {
                    form.file = Some((filename, bytes));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}
