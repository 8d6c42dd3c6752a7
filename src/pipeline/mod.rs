//! Pipeline stages for one analysis run.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! can be tested without the others (and without network access).
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ classify ──▶ extract ──▶ prompt ──▶ llm ──▶ postprocess
//! (temp file) (strategy)  (b64/text)  (parts)    (model)  (safe HTML)
//! ```
//!
//! 1. [`intake`]      : persist the upload to a uniquely named temp file that
//!    deletes itself when dropped
//! 2. [`classify`]    : extension → [`classify::ExtractionStrategy`]; pure
//! 3. [`extract`]     : base64 for images, text layer for PDFs
//! 4. [`prompt`]      : system instruction + content → ordered content parts
//! 5. [`llm`]         : the one external call; the only stage with network I/O
//! 6. [`postprocess`] : markdown subset → HTML → allow-list sanitizer

pub mod classify;
pub mod extract;
pub mod intake;
pub mod llm;
pub mod postprocess;
pub mod prompt;
