use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics even before
/// the first run touches them).
pub fn ensure_pipeline_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "posts_collected_total",
            "Posts returned by the search collaborator."
        );
        describe_counter!(
            "posts_kept_total",
            "Posts that passed the recency filter."
        );
        describe_counter!("posts_scored_total", "Posts scored successfully.");
        describe_counter!(
            "posts_skipped_total",
            "Posts dropped because their analysis call failed."
        );
        describe_counter!("scrape_errors_total", "Search collaborator failures.");
        describe_counter!(
            "search_posts_total",
            "Posts parsed from the search endpoint."
        );
        describe_histogram!(
            "search_fetch_ms",
            "Round-trip time of one search call in milliseconds."
        );
        describe_counter!(
            "analysis_errors_total",
            "Analysis collaborator failures."
        );
        describe_counter!(
            "queue_backoffs_total",
            "Backoff pauses taken by the request queue."
        );
        describe_histogram!(
            "analysis_latency_ms",
            "Round-trip time of one analysis call in milliseconds."
        );
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when an analysis run last completed."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder.
    pub fn init() -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");
        ensure_pipeline_metrics_described();
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
