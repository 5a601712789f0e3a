// src/types.rs
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A post as returned by the search collaborator. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPost {
    pub text: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
}

impl RawPost {
    /// Engagement is derived wherever ranking needs it, never stored.
    pub fn engagement(&self) -> u64 {
        self.likes + self.retweets + self.replies
    }
}

/// Caller-supplied bounds on recency and volume for one analysis run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectionWindow {
    pub hours_back: i64,
    pub max_items: usize,
}

pub const MIN_MAX_ITEMS: usize = 10;
pub const MAX_MAX_ITEMS: usize = 100;

impl SelectionWindow {
    pub fn new(hours_back: i64, max_items: usize) -> Self {
        Self {
            hours_back,
            max_items,
        }
    }

    /// Rejects a malformed window before any external call is made.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.hours_back < 1 {
            return Err(PipelineError::Validation(format!(
                "hours_back must be >= 1, got {}",
                self.hours_back
            )));
        }
        if !(MIN_MAX_ITEMS..=MAX_MAX_ITEMS).contains(&self.max_items) {
            return Err(PipelineError::Validation(format!(
                "max_items must be in [{MIN_MAX_ITEMS}, {MAX_MAX_ITEMS}], got {}",
                self.max_items
            )));
        }
        Ok(())
    }

    /// How many of the surviving posts get analyzed. Caps the downstream
    /// analysis cost at 15 calls while never going below 10.
    pub fn top_k(&self) -> usize {
        (self.max_items / 3).min(15).max(MIN_MAX_ITEMS)
    }
}

impl Default for SelectionWindow {
    fn default() -> Self {
        Self {
            hours_back: 24,
            max_items: 50,
        }
    }
}

/// Where a scored text came from. Ad-hoc texts (no feed) still carry
/// `Primary` so downstream consumers see a single shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Primary,
}

/// One post together with the analysis that justified its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPost {
    pub post: RawPost,
    pub analysis_text: String,
    /// Usually in [-1, 1]; the primary parse passes through whatever figure
    /// the analysis collaborator reported, unclamped.
    pub sentiment_score: f64,
    pub source: SourceTag,
    pub engagement: u64,
}

/// Summary statistics over the surviving sentiment scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1 divisor); reported as 0.0 for a single
    /// sample instead of NaN.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub avg_engagement: f64,
}

/// The final record of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub ticker: String,
    pub weighted_sentiment: f64,
    pub stats: SentimentStats,
    pub themes: BTreeSet<String>,
    /// Preserves the engagement-descending selection order, not score order.
    pub scored_posts: Vec<ScoredPost>,
    /// Narrative market summary; absent when the summary call fails or the
    /// run was an ad-hoc batch.
    pub summary: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_table() {
        assert_eq!(SelectionWindow::new(24, 50).top_k(), 15);
        assert_eq!(SelectionWindow::new(24, 10).top_k(), 10);
        assert_eq!(SelectionWindow::new(24, 30).top_k(), 10);
        assert_eq!(SelectionWindow::new(24, 100).top_k(), 15);
        assert_eq!(SelectionWindow::new(24, 45).top_k(), 15);
    }

    #[test]
    fn window_bounds_are_enforced() {
        assert!(SelectionWindow::new(24, 9).validate().is_err());
        assert!(SelectionWindow::new(24, 101).validate().is_err());
        assert!(SelectionWindow::new(0, 50).validate().is_err());
        assert!(SelectionWindow::new(1, 10).validate().is_ok());
        assert!(SelectionWindow::new(24, 100).validate().is_ok());
    }
}
