// tests/api_http.rs
// Router-level smoke tests via tower `oneshot` (no listener). The status
// mapping is part of the contract: a caller must be able to tell "no data
// in this window" apart from "collaborator unreachable".

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use tower::ServiceExt; // for `oneshot`

use crypto_sentiment_analyzer::api::{create_router, AppState};
use crypto_sentiment_analyzer::config::WindowDefaults;
use crypto_sentiment_analyzer::engine::Engine;
use crypto_sentiment_analyzer::progress::ProgressSink;
use crypto_sentiment_analyzer::providers::{AnalysisClient, PostSource};
use crypto_sentiment_analyzer::types::RawPost;

struct FixedSearch {
    posts: Vec<RawPost>,
}

#[async_trait::async_trait]
impl PostSource for FixedSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<RawPost>> {
        Ok(self.posts.clone())
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct BrokenSearch;

#[async_trait::async_trait]
impl PostSource for BrokenSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<RawPost>> {
        anyhow::bail!("dns failure")
    }
    fn name(&self) -> &'static str {
        "broken"
    }
}

struct CannedAnalysis;

#[async_trait::async_trait]
impl AnalysisClient for CannedAnalysis {
    async fn analyze(&self, _prompt: &str) -> Result<String> {
        Ok("Constructive discussion, rising volume.\nSentiment Score: 0.25".to_string())
    }
    fn provider_name(&self) -> &'static str {
        "canned"
    }
}

fn fresh_posts(n: usize) -> Vec<RawPost> {
    (0..n)
        .map(|i| RawPost {
            text: format!("post {i}"),
            author: format!("user{i}"),
            timestamp: Utc::now() - Duration::minutes(30 + i as i64),
            likes: (n - i) as u64,
            retweets: 0,
            replies: 0,
        })
        .collect()
}

fn app(source: Arc<dyn PostSource>) -> Router {
    let engine = Arc::new(Engine::new(
        source,
        Arc::new(CannedAnalysis),
        ProgressSink::disabled(),
    ));
    create_router(AppState {
        engine,
        window_defaults: WindowDefaults::default(),
    })
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn analyze_happy_path_returns_the_aggregate() {
    let app = app(Arc::new(FixedSearch {
        posts: fresh_posts(12),
    }));

    let resp = app
        .oneshot(post_json("/analyze", r#"{"ticker":"$BTC"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let s = body_string(resp).await;
    assert!(s.contains("\"weighted_sentiment\""));
    assert!(s.contains("\"themes\""));
    assert!(s.contains("\"ticker\":\"$BTC\""));
}

#[tokio::test(start_paused = true)]
async fn bad_window_is_rejected_with_400() {
    let app = app(Arc::new(FixedSearch {
        posts: fresh_posts(12),
    }));

    let resp = app
        .oneshot(post_json("/analyze", r#"{"ticker":"$BTC","max_items":5}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(resp).await.contains("\"kind\":\"validation\""));
}

#[tokio::test(start_paused = true)]
async fn empty_window_maps_to_404() {
    let app = app(Arc::new(FixedSearch { posts: vec![] }));

    let resp = app
        .oneshot(post_json("/analyze", r#"{"ticker":"$BTC"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_string(resp).await.contains("\"kind\":\"no_data\""));
}

#[tokio::test(start_paused = true)]
async fn broken_collaborator_maps_to_502() {
    let app = app(Arc::new(BrokenSearch));

    let resp = app
        .oneshot(post_json("/analyze", r#"{"ticker":"$BTC"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert!(body_string(resp)
        .await
        .contains("\"kind\":\"scrape_unavailable\""));
}

#[tokio::test]
async fn single_text_endpoint_scores_without_collection() {
    let app = app(Arc::new(BrokenSearch)); // collection must not be touched

    let resp = app
        .oneshot(post_json(
            "/analyze/text",
            r#"{"text":"BTC consolidating above support"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let s = body_string(resp).await;
    assert!(s.contains("\"sentiment_score\":0.25"));
}

#[tokio::test]
async fn batch_endpoint_aggregates_uniformly() {
    let app = app(Arc::new(BrokenSearch));

    let resp = app
        .oneshot(post_json(
            "/analyze/batch",
            r#"{"texts":["one take","another take"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let s = body_string(resp).await;
    assert!(s.contains("\"count\":2"));
    assert!(s.contains("\"weighted_sentiment\":0.25"));
}

#[tokio::test]
async fn health_endpoint_is_up() {
    let app = app(Arc::new(BrokenSearch));
    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
