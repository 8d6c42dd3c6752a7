//! Shared fixtures for the integration tests.
//!
//! Nothing here talks to a real model: [`RecordingClient`] stands in for the
//! provider and [`RecordingObserver`] captures the stage sequence.

#![allow(dead_code)]

use futures::future::BoxFuture;
use medlens::{
    Analyzer, AnalyzerConfig, InferenceClient, InferenceError, ModelPrompt, Stage, StageObserver,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake model does when called.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Sleep before answering; used to trip timeouts and cancellation.
    Slow(Duration, String),
}

/// Fake [`InferenceClient`] that records every prompt it receives.
pub struct RecordingClient {
    reply: Reply,
    prompts: Mutex<Vec<ModelPrompt>>,
}

impl RecordingClient {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(text: &str) -> Arc<Self> {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn prompts(&self) -> Vec<ModelPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

impl InferenceClient for RecordingClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a ModelPrompt,
    ) -> BoxFuture<'a, Result<String, InferenceError>> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let reply = self.reply.clone();
        Box::pin(async move {
            match reply {
                Reply::Text(text) => Ok(text),
                Reply::Fail(msg) => Err(InferenceError::Provider(msg)),
                Reply::Slow(delay, text) => {
                    tokio::time::sleep(delay).await;
                    Ok(text)
                }
            }
        })
    }
}

/// Observer that keeps every stage it is told about.
#[derive(Default)]
pub struct RecordingObserver {
    stages: Mutex<Vec<Stage>>,
}

impl RecordingObserver {
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.lock().unwrap().clone()
    }
}

impl StageObserver for RecordingObserver {
    fn on_stage(&self, _request_id: &str, stage: Stage) {
        self.stages.lock().unwrap().push(stage);
    }
}

/// Config pointing uploads at `upload_dir`, with a short inference timeout.
pub fn test_config(upload_dir: &Path) -> AnalyzerConfig {
    AnalyzerConfig::builder()
        .upload_dir(upload_dir)
        .api_timeout_secs(1)
        .build()
        .unwrap()
}

/// Analyzer wired to `client`, with a recording observer.
pub fn analyzer(
    upload_dir: &Path,
    client: Arc<RecordingClient>,
) -> (Analyzer, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let analyzer = Analyzer::new(test_config(upload_dir), client).with_observer(observer.clone());
    (analyzer, observer)
}

/// Number of entries left in the upload directory.
pub fn files_in(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

/// A one-page PDF whose only content is `text` in Helvetica.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    let stream = format!("BT /F1 24 Tf 72 712 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
         /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    out
}
