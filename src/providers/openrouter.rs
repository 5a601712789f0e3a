// src/providers/openrouter.rs
// OpenRouter chat-completions client for the text-analysis side. Any
// non-success response surfaces as an error; the pipeline decides what a
// failed analysis means.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::providers::AnalysisClient;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(cfg: &AnalysisConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("crypto-sentiment-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }
    }

    /// Reads `OPENROUTER_API_KEY`; errors early instead of failing on the
    /// first analysis call.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY environment variable not set"))?;
        Ok(Self::new(&AnalysisConfig {
            provider: "openrouter".to_string(),
            api_key,
            model: model.into(),
        }))
    }
}

#[async_trait::async_trait]
impl AnalysisClient for OpenRouterClient {
    async fn analyze(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        if self.api_key.is_empty() {
            anyhow::bail!("analysis API key is not configured");
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "http://localhost:8000")
            .header("X-Title", "Crypto Sentiment Analyzer")
            .json(&req)
            .send()
            .await
            .context("analysis request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("analysis API returned status {}", resp.status());
        }

        let body: Resp = resp.json().await.context("parsing analysis response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.is_empty() {
            anyhow::bail!("analysis API returned an empty completion");
        }
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}
