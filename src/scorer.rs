//! # Sentiment Scorer
//! Turns a post's text into a numeric sentiment score plus the analysis text
//! that justifies it, one analysis-collaborator call per post.
//!
//! Score extraction is two-stage: parse the number the analysis itself
//! reports, and only if that fails fall back to a deterministic keyword
//! heuristic. A per-post failure becomes a `Skipped` outcome, never an
//! aborted batch.

use std::time::Instant;

use metrics::{counter, histogram};

use crate::error::PipelineError;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::providers::DynAnalysisClient;
use crate::types::{RawPost, ScoredPost, SourceTag};

const SCORE_MARKERS: [&str; 4] = ["score:", "score is:", "sentiment:", "rating:"];

const POSITIVE_WORDS: [&str; 5] = ["bullish", "positive", "optimistic", "growth", "gain"];
const NEGATIVE_WORDS: [&str; 5] = ["bearish", "negative", "pessimistic", "decline", "loss"];

/// Free-text analysis plus the score extracted from it.
#[derive(Debug, Clone)]
pub struct TextAnalysis {
    pub text: String,
    pub score: f64,
}

/// Outcome of scoring one post. Skips carry the reason so the batch can log
/// them; they are filtered out, not propagated.
#[derive(Debug)]
pub enum ScoreOutcome {
    Scored(ScoredPost),
    Skipped { reason: String },
}

/// Primary parse: the last line mentioning a score marker, first whitespace
/// token after its final colon, as f64. The value is passed through
/// unclamped, whatever the analysis reported.
pub fn extract_score(analysis: &str) -> Option<f64> {
    let line = analysis
        .lines()
        .filter(|l| {
            let lower = l.to_lowercase();
            SCORE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .next_back()?;
    line.rsplit(':')
        .next()?
        .split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
}

/// Fallback heuristic over fixed keyword sets. Zero hits yields exactly 0.
pub fn keyword_score(analysis: &str) -> f64 {
    let lower = analysis.to_lowercase();
    let pos: usize = POSITIVE_WORDS.iter().map(|w| lower.matches(w).count()).sum();
    let neg: usize = NEGATIVE_WORDS.iter().map(|w| lower.matches(w).count()).sum();
    let total = pos + neg;
    if total == 0 {
        0.0
    } else {
        (pos as f64 - neg as f64) / total as f64
    }
}

fn build_analysis_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of this crypto-related text. Follow these steps:\n\
         1. Identify key sentiment indicators\n\
         2. Consider market impact and technical factors\n\
         3. Evaluate overall sentiment\n\
         4. Provide a sentiment score from -1 (very negative) to 1 (very positive)\n\
         \n\
         Text: {text}\n\
         \n\
         Provide your analysis in clear steps and end with a numerical score."
    )
}

pub struct SentimentScorer {
    client: DynAnalysisClient,
}

impl SentimentScorer {
    pub fn new(client: DynAnalysisClient) -> Self {
        Self { client }
    }

    /// One analysis call for `text`. Fails when the collaborator errors or
    /// returns a non-success status.
    pub async fn score_text(&self, text: &str) -> Result<TextAnalysis, PipelineError> {
        let prompt = build_analysis_prompt(text);
        let t0 = Instant::now();
        let analysis = self.client.analyze(&prompt).await.map_err(|e| {
            counter!("analysis_errors_total").increment(1);
            PipelineError::AnalysisUnavailable(e.to_string())
        })?;
        histogram!("analysis_latency_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let score = extract_score(&analysis).unwrap_or_else(|| keyword_score(&analysis));
        Ok(TextAnalysis {
            text: analysis,
            score,
        })
    }

    pub async fn score_post(&self, post: RawPost) -> ScoreOutcome {
        let engagement = post.engagement();
        match self.score_text(&post.text).await {
            Ok(analysis) => ScoreOutcome::Scored(ScoredPost {
                post,
                analysis_text: analysis.text,
                sentiment_score: analysis.score,
                source: SourceTag::Primary,
                engagement,
            }),
            Err(e) => ScoreOutcome::Skipped {
                reason: e.to_string(),
            },
        }
    }

    /// Score each post independently, in order. One post's failure never
    /// cancels its siblings; if every post fails the result is empty and the
    /// caller treats that as the no-data condition.
    pub async fn score_many(&self, posts: Vec<RawPost>, progress: &ProgressSink) -> Vec<ScoredPost> {
        let total = posts.len();
        progress.emit(ProgressEvent::ScoringStarted { total });

        let mut scored = Vec::with_capacity(total);
        for (index, post) in posts.into_iter().enumerate() {
            match self.score_post(post).await {
                ScoreOutcome::Scored(sp) => {
                    counter!("posts_scored_total").increment(1);
                    progress.emit(ProgressEvent::PostScored {
                        index,
                        total,
                        score: sp.sentiment_score,
                    });
                    scored.push(sp);
                }
                ScoreOutcome::Skipped { reason } => {
                    counter!("posts_skipped_total").increment(1);
                    tracing::warn!(index, total, %reason, "skipping post");
                    progress.emit(ProgressEvent::PostSkipped {
                        index,
                        total,
                        reason,
                    });
                }
            }
        }
        scored
    }
}
