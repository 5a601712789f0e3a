// src/error.rs
use thiserror::Error;

/// Failure taxonomy of the analysis pipeline.
///
/// `NoData` is the only fatal condition of the happy path and must stay
/// distinguishable from the transport failures, so a caller can message
/// "no data in this window" differently from "service unreachable".
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("search collaborator unavailable: {0}")]
    ScrapeUnavailable(anyhow::Error),

    #[error("analysis collaborator unavailable: {0}")]
    AnalysisUnavailable(String),

    #[error("no analyzable data: {0}")]
    NoData(String),

    #[error("invalid selection window: {0}")]
    Validation(String),
}

impl PipelineError {
    pub fn no_data_in_window(ticker: &str, hours_back: i64) -> Self {
        Self::NoData(format!(
            "no posts for {ticker} within the last {hours_back}h"
        ))
    }

    /// Stable machine-readable tag, used by the HTTP layer and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScrapeUnavailable(_) => "scrape_unavailable",
            Self::AnalysisUnavailable(_) => "analysis_unavailable",
            Self::NoData(_) => "no_data",
            Self::Validation(_) => "validation",
        }
    }
}
