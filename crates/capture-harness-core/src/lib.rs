//! # Capture Harness Core
//!
//! Pure logic for Capture Harness: data models, the classification
//! normalizer, keyword heuristics, goal period math, entry/goal routing,
//! the capture pipeline, and the storage abstraction.
//!
//! This crate performs no network or filesystem I/O. The classifier and
//! the database are reached through the [`pipeline::ClassificationSource`]
//! and [`store::Store`] traits, which the `capture-harness` crate
//! implements over HTTP and SQLite.
//!
//! ## Pipeline
//!
//! ```text
//! raw text ──▶ classifier ──▶ normalize ──▶ category lookup ──▶ route ──▶ store
//!              (may fail)     (+keyword      (slug → id)        (entry |
//!                              overrides)                         goal + history)
//! ```

pub mod classification;
pub mod heuristics;
pub mod models;
pub mod normalize;
pub mod period;
pub mod pipeline;
pub mod router;
pub mod session;
pub mod store;
pub mod tracker;

pub use classification::{ClassificationMetadata, ClassificationResult};
pub use normalize::{normalize, CaptureKind, NormalizedCapture};
pub use pipeline::{
    capture, AiStatus, CaptureError, CaptureOutcome, ClassificationSource, ClassifierOutcome,
};
pub use router::RoutedRecord;
pub use session::Session;
