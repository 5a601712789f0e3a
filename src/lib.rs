// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod providers;
pub mod queue;
pub mod scorer;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::engine::Engine;
pub use crate::error::PipelineError;
pub use crate::progress::{ProgressEvent, ProgressSink};
pub use crate::queue::RequestQueue;
pub use crate::types::{AggregateResult, RawPost, ScoredPost, SelectionWindow};
