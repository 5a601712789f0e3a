// src/config.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::types::{MAX_MAX_ITEMS, MIN_MAX_ITEMS};

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_search_base_url() -> String {
    "http://localhost:9000".to_string()
}
fn default_provider() -> String {
    "openrouter".to_string()
}
fn default_model() -> String {
    "deepseek/deepseek-r1".to_string()
}
fn default_hours_back() -> i64 {
    24
}
fn default_max_items() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub window: WindowDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    /// "ENV" means: read from SEARCH_API_TOKEN. Empty means unauthenticated.
    #[serde(default)]
    pub api_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// "openrouter" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// "ENV" means: read from OPENROUTER_API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

/// Selection-window defaults applied when a request omits them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowDefaults {
    #[serde(default = "default_hours_back")]
    pub hours_back: i64,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            api_token: String::new(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl Default for WindowDefaults {
    fn default() -> Self {
        Self {
            hours_back: default_hours_back(),
            max_items: default_max_items(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            search: SearchConfig::default(),
            analysis: AnalysisConfig::default(),
            window: WindowDefaults::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AppConfig = serde_json::from_str(&data)?;

        // Normalize provider
        cfg.analysis.provider = cfg.analysis.provider.to_lowercase();

        // Resolve api keys if "ENV"
        if cfg.analysis.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.analysis.api_key = env::var("OPENROUTER_API_KEY")
                .map_err(|_| anyhow::anyhow!("Missing OPENROUTER_API_KEY env var"))?;
        }
        if cfg.search.api_token.trim().eq_ignore_ascii_case("env") {
            cfg.search.api_token = env::var("SEARCH_API_TOKEN")
                .map_err(|_| anyhow::anyhow!("Missing SEARCH_API_TOKEN env var"))?;
        }

        sanitize_window(&mut cfg.window);

        Ok(cfg)
    }

    /// Falls back to defaults when the file is absent or unparsable, so a
    /// bare checkout still boots.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = ?e, path = %path.as_ref().display(), "config load failed, using defaults");
                Self::default()
            }
        }
    }
}

/// Window defaults outside the accepted ranges fall back silently; the
/// per-request validation still rejects explicit bad input.
fn sanitize_window(window: &mut WindowDefaults) {
    if window.hours_back < 1 {
        window.hours_back = default_hours_back();
    }
    if !(MIN_MAX_ITEMS..=MAX_MAX_ITEMS).contains(&window.max_items) {
        window.max_items = default_max_items();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.window.hours_back, 24);
        assert_eq!(cfg.window.max_items, 50);
        assert_eq!(cfg.analysis.provider, "openrouter");
    }

    #[test]
    fn out_of_range_window_defaults_are_reset() {
        let json = r#"{"window": {"hours_back": 0, "max_items": 500}}"#;
        let mut cfg: AppConfig = serde_json::from_str(json).unwrap();
        sanitize_window(&mut cfg.window);
        assert_eq!(cfg.window.hours_back, 24);
        assert_eq!(cfg.window.max_items, 50);
    }
}
