// src/progress.rs
// Typed progress stream: the pipeline produces events, the presentation
// layer consumes them independently (logs, SSE, a dashboard — its choice).

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    CollectionStarted {
        ticker: String,
    },
    PostsCollected {
        total: usize,
        within_window: usize,
    },
    PostsSelected {
        count: usize,
    },
    ScoringStarted {
        total: usize,
    },
    PostScored {
        index: usize,
        total: usize,
        score: f64,
    },
    PostSkipped {
        index: usize,
        total: usize,
        reason: String,
    },
    SummaryStarted,
    Completed {
        weighted_sentiment: f64,
        count: usize,
    },
}

/// Cheap-to-clone sender half. A disabled sink swallows everything, so the
/// pipeline never has to care whether anyone is listening.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // A dropped receiver must not disturb the pipeline.
            let _ = tx.send(event);
        }
    }
}
