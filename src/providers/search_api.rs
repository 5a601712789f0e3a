// src/providers/search_api.rs
// HTTP search collaborator: a JSON endpoint fronting the post scraper.
// The pipeline never talks to it directly; every call goes through the
// request queue.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::providers::PostSource;
use crate::types::RawPost;

#[derive(Debug, Deserialize)]
struct ApiPost {
    text: String,
    author: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    retweets: u64,
    #[serde(default)]
    replies: u64,
}

pub struct SearchApiProvider {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl SearchApiProvider {
    pub fn new(cfg: &SearchConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("crypto-sentiment-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_token: cfg.api_token.clone(),
        }
    }
}

#[async_trait::async_trait]
impl PostSource for SearchApiProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawPost>> {
        let t0 = std::time::Instant::now();

        let url = format!("{}/search", self.base_url);
        let max_results = max_results.to_string();
        let mut req = self
            .http
            .get(&url)
            .query(&[("query", query), ("max_results", max_results.as_str())]);
        if !self.api_token.is_empty() {
            req = req.bearer_auth(&self.api_token);
        }

        let resp = req.send().await.context("search request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("search endpoint returned status {}", resp.status());
        }
        let posts: Vec<ApiPost> = resp.json().await.context("parsing search response")?;

        let out: Vec<RawPost> = posts
            .into_iter()
            .map(|p| RawPost {
                text: p.text,
                author: p.author,
                timestamp: p.timestamp,
                likes: p.likes,
                retweets: p.retweets,
                replies: p.replies,
            })
            .collect();

        histogram!("search_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("search_posts_total").increment(out.len() as u64);

        Ok(out)
    }

    fn name(&self) -> &'static str {
        "search-api"
    }
}
