//! # Analysis Engine
//! Chains Collector → SentimentScorer → Aggregator behind the three public
//! entry points, owns the shared request queue, and emits progress events
//! for whoever is listening. Pure logic lives in the stage modules; this is
//! the wiring.

use metrics::gauge;

use crate::aggregate;
use crate::collector::Collector;
use crate::error::PipelineError;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::providers::{DynAnalysisClient, DynPostSource};
use crate::queue::RequestQueue;
use crate::scorer::{ScoreOutcome, SentimentScorer};
use crate::types::{AggregateResult, RawPost, ScoredPost, SelectionWindow};

/// Ticker recorded on ad-hoc batch results, which have no real symbol.
const AD_HOC_TICKER: &str = "ad-hoc";

pub struct Engine {
    collector: Collector,
    scorer: SentimentScorer,
    analysis: DynAnalysisClient,
    progress: ProgressSink,
}

impl Engine {
    /// One queue instance per engine; every search request funnels through
    /// it so the collaborator's rate limit is respected globally.
    pub fn new(
        source: DynPostSource,
        analysis: DynAnalysisClient,
        progress: ProgressSink,
    ) -> Self {
        crate::metrics::ensure_pipeline_metrics_described();
        let queue = RequestQueue::new();
        Self {
            collector: Collector::new(source, queue),
            scorer: SentimentScorer::new(analysis.clone()),
            analysis,
            progress,
        }
    }

    /// The full pipeline for one ticker. Fails with `NoData` when either
    /// zero posts pass the recency filter or zero posts survive analysis.
    pub async fn run_analysis(
        &self,
        ticker: &str,
        window: SelectionWindow,
    ) -> Result<AggregateResult, PipelineError> {
        window.validate()?;
        self.progress.emit(ProgressEvent::CollectionStarted {
            ticker: ticker.to_string(),
        });
        tracing::info!(
            ticker,
            hours_back = window.hours_back,
            max_items = window.max_items,
            "starting analysis run"
        );

        let posts = self.collector.collect(ticker, window, &self.progress).await?;
        if posts.is_empty() {
            return Err(PipelineError::no_data_in_window(ticker, window.hours_back));
        }

        let scored = self.scorer.score_many(posts, &self.progress).await;
        if scored.is_empty() {
            return Err(PipelineError::NoData(format!(
                "could not analyze any posts for {ticker}"
            )));
        }

        let mut result = aggregate::aggregate(ticker, scored)?;

        self.progress.emit(ProgressEvent::SummaryStarted);
        result.summary = self.generate_summary(&result).await;

        gauge!("pipeline_last_run_ts").set(result.timestamp.timestamp() as f64);
        self.progress.emit(ProgressEvent::Completed {
            weighted_sentiment: result.weighted_sentiment,
            count: result.stats.count,
        });
        tracing::info!(
            ticker,
            weighted_sentiment = result.weighted_sentiment,
            count = result.stats.count,
            "analysis run finished"
        );
        Ok(result)
    }

    /// Ad-hoc scoring of one text, bypassing collection. Engagement is 0.
    pub async fn score_single_text(&self, text: &str) -> Result<ScoredPost, PipelineError> {
        match self.scorer.score_post(ad_hoc_post(text)).await {
            ScoreOutcome::Scored(sp) => Ok(sp),
            ScoreOutcome::Skipped { reason } => Err(PipelineError::AnalysisUnavailable(reason)),
        }
    }

    /// Ad-hoc scoring of a batch of texts. All engagement is 0, so the
    /// aggregate falls on the uniform-weight branch. No narrative summary.
    pub async fn score_multiple_texts(
        &self,
        texts: Vec<String>,
    ) -> Result<AggregateResult, PipelineError> {
        let posts: Vec<RawPost> = texts.iter().map(|t| ad_hoc_post(t)).collect();
        let scored = self.scorer.score_many(posts, &self.progress).await;
        if scored.is_empty() {
            return Err(PipelineError::NoData(
                "could not analyze any of the supplied texts".to_string(),
            ));
        }
        aggregate::aggregate(AD_HOC_TICKER, scored)
    }

    /// Narrative market summary over the finished aggregate. Failure-tolerant
    /// on purpose: a missing summary never fails the run.
    async fn generate_summary(&self, result: &AggregateResult) -> Option<String> {
        let prompt = build_summary_prompt(result);
        match self.analysis.analyze(&prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = ?e, ticker = %result.ticker, "summary generation failed");
                None
            }
        }
    }
}

fn ad_hoc_post(text: &str) -> RawPost {
    RawPost {
        text: text.to_string(),
        author: AD_HOC_TICKER.to_string(),
        timestamp: chrono::Utc::now(),
        likes: 0,
        retweets: 0,
        replies: 0,
    }
}

fn build_summary_prompt(result: &AggregateResult) -> String {
    let themes: Vec<&str> = result.themes.iter().map(|s| s.as_str()).collect();
    format!(
        "Generate a comprehensive market analysis for {ticker} covering:\n\
         1. Overall market sentiment and confidence level\n\
         2. Key factors driving sentiment\n\
         3. Potential price impact\n\
         4. Risk factors to consider\n\
         5. Short-term outlook (24-48 hours)\n\
         \n\
         End with a clear conclusion summarizing the key points.\n\
         \n\
         Context:\n\
         - Weighted sentiment score: {weighted:.2}\n\
         - Number of sources analyzed: {count}\n\
         - Sentiment range: {min:.2} to {max:.2}\n\
         - Common themes: {themes}",
        ticker = result.ticker,
        weighted = result.weighted_sentiment,
        count = result.stats.count,
        min = result.stats.min,
        max = result.stats.max,
        themes = themes.join(", "),
    )
}
