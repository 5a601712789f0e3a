// src/providers/mod.rs
pub mod openrouter;
pub mod search_api;

use std::sync::Arc;

use anyhow::Result;

use crate::types::RawPost;

/// Search collaborator: returns recent posts matching a query. May return
/// fewer than `max_results`. Error subtypes are not interpreted here.
#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawPost>>;
    fn name(&self) -> &'static str;
}

pub type DynPostSource = Arc<dyn PostSource>;

/// Text-analysis collaborator: free-text in, free-text out. A non-success
/// response surfaces as an error; the pipeline only consumes the text.
#[async_trait::async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, prompt: &str) -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub type DynAnalysisClient = Arc<dyn AnalysisClient>;
