// src/collector.rs
// Produces a bounded, recency-filtered, engagement-ranked set of posts for
// analysis. All search traffic goes through the request queue, so this
// never issues two collaborator calls at once.

use chrono::{DateTime, Duration, Utc};
use metrics::counter;

use crate::error::PipelineError;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::providers::DynPostSource;
use crate::queue::RequestQueue;
use crate::types::{RawPost, SelectionWindow};

pub struct Collector {
    source: DynPostSource,
    queue: RequestQueue<Vec<RawPost>>,
}

/// Bare symbol, retweets excluded; language filtering happens on the
/// collaborator side.
pub fn build_search_query(ticker: &str) -> String {
    format!("{ticker} -is:retweet lang:en")
}

/// Recency filter + engagement ranking + top-k cut, pure over `now`.
/// Returns the selection and how many posts passed the recency filter.
/// Ties in engagement keep the server's original order (stable sort).
pub fn select_posts(
    now: DateTime<Utc>,
    posts: Vec<RawPost>,
    window: &SelectionWindow,
) -> (Vec<RawPost>, usize) {
    let cutoff = now - Duration::hours(window.hours_back);
    let mut kept: Vec<RawPost> = posts
        .into_iter()
        .filter(|p| p.timestamp > cutoff)
        .collect();
    let within_window = kept.len();

    kept.sort_by_key(|p| std::cmp::Reverse(p.engagement()));
    kept.truncate(window.top_k());

    (kept, within_window)
}

impl Collector {
    /// The queue instance is passed in explicitly so every component that
    /// talks to the search collaborator shares one schedule.
    pub fn new(source: DynPostSource, queue: RequestQueue<Vec<RawPost>>) -> Self {
        Self { source, queue }
    }

    /// Fetch, filter and rank posts for `ticker`. An empty result is a
    /// normal outcome, not an error; the caller decides whether it is fatal.
    pub async fn collect(
        &self,
        ticker: &str,
        window: SelectionWindow,
        progress: &ProgressSink,
    ) -> Result<Vec<RawPost>, PipelineError> {
        window.validate()?;

        let query = build_search_query(ticker);
        let max_results = window.max_items;
        let source = self.source.clone();
        tracing::info!(ticker, %query, max_results, "collecting posts");

        let handle = self
            .queue
            .submit(move || async move { source.search(&query, max_results).await });
        let posts = handle.wait().await.map_err(|e| {
            counter!("scrape_errors_total").increment(1);
            PipelineError::ScrapeUnavailable(e)
        })?;

        let total = posts.len();
        let (selected, within_window) = select_posts(Utc::now(), posts, &window);

        counter!("posts_collected_total").increment(total as u64);
        counter!("posts_kept_total").increment(within_window as u64);
        progress.emit(ProgressEvent::PostsCollected {
            total,
            within_window,
        });
        progress.emit(ProgressEvent::PostsSelected {
            count: selected.len(),
        });
        tracing::info!(
            ticker,
            total,
            within_window,
            selected = selected.len(),
            "collection finished"
        );

        Ok(selected)
    }
}
