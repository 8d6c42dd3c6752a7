//! Per-request lifecycle: stages, failure kinds, and an observer hook.
//!
//! Every run moves through
//!
//! ```text
//! Received → Classified → Extracted → Prompted → Inferred → Normalized → Cleaned → Responded
//!                 │            │                     │
//!                 └────────────┴──── Failed(kind) ───┴──▶ Cleaned → Responded
//! ```
//!
//! Query-only runs have nothing to extract and go straight from `Classified`
//! to `Prompted`. Whatever happens, `Cleaned` is reported before `Responded`.
//!
//! Inject an [`Arc<dyn StageObserver>`] via [`crate::Analyzer::with_observer`]
//! to receive transitions as they happen.
//!
//! # Example
//!
//! ```rust
//! use medlens::{Stage, StageObserver};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<Stage>>);
//!
//! impl StageObserver for Recorder {
//!     fn on_stage(&self, _request_id: &str, stage: Stage) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let observer: Arc<dyn StageObserver> = Arc::new(Recorder::default());
//! observer.on_stage("req-1", Stage::Received);
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Why a run ended in [`Stage::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    UnsupportedFileType,
    Intake,
    Extraction,
    Inference,
    Sanitization,
}

/// A state in the per-request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Classified,
    Extracted,
    Prompted,
    Inferred,
    Normalized,
    Failed(FailureKind),
    Cleaned,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Received => f.write_str("received"),
            Stage::Classified => f.write_str("classified"),
            Stage::Extracted => f.write_str("extracted"),
            Stage::Prompted => f.write_str("prompted"),
            Stage::Inferred => f.write_str("inferred"),
            Stage::Normalized => f.write_str("normalized"),
            Stage::Failed(kind) => write!(f, "failed({kind:?})"),
            Stage::Cleaned => f.write_str("cleaned"),
            Stage::Responded => f.write_str("responded"),
        }
    }
}

/// Called by the analyzer on every stage transition.
///
/// Implementations must be `Send + Sync`: one observer is shared by every
/// concurrent run. The default implementation does nothing.
pub trait StageObserver: Send + Sync {
    /// `request_id` is the UUID also attached to the run's tracing span.
    fn on_stage(&self, request_id: &str, stage: Stage) {
        let _ = (request_id, stage);
    }
}

/// The observer used when none is configured.
pub struct NoopObserver;

impl StageObserver for NoopObserver {}

/// Convenience alias for the type held by [`crate::Analyzer`].
pub type Observer = Arc<dyn StageObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, Stage)>>);

    impl StageObserver for Recorder {
        fn on_stage(&self, request_id: &str, stage: Stage) {
            self.0.lock().unwrap().push((request_id.to_string(), stage));
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_stage("r", Stage::Received);
        obs.on_stage("r", Stage::Failed(FailureKind::Inference));
    }

    #[test]
    fn arc_dyn_observer_records() {
        let rec = Arc::new(Recorder::default());
        let obs: Observer = rec.clone();
        obs.on_stage("abc", Stage::Received);
        obs.on_stage("abc", Stage::Cleaned);

        let seen = rec.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], ("abc".to_string(), Stage::Cleaned));
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Normalized.to_string(), "normalized");
        assert_eq!(
            Stage::Failed(FailureKind::Extraction).to_string(),
            "failed(Extraction)"
        );
    }
}
