use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::WindowDefaults;
use crate::engine::Engine;
use crate::error::PipelineError;
use crate::types::{AggregateResult, ScoredPost, SelectionWindow};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub window_defaults: WindowDefaults,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", post(analyze_ticker))
        .route("/analyze/text", post(analyze_text))
        .route("/analyze/batch", post(analyze_batch))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    ticker: String,
    #[serde(default)]
    hours_back: Option<i64>,
    #[serde(default)]
    max_items: Option<usize>,
}

#[derive(serde::Deserialize)]
struct TextReq {
    text: String,
}

#[derive(serde::Deserialize)]
struct BatchReq {
    texts: Vec<String>,
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

/// Maps the pipeline taxonomy onto HTTP statuses: bad request for window
/// validation, 404 for an empty window (so a UI can message "no data"
/// instead of "service down"), 502 for collaborator transport failures.
struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::NoData(_) => StatusCode::NOT_FOUND,
            PipelineError::ScrapeUnavailable(_) | PipelineError::AnalysisUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

async fn analyze_ticker(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Result<Json<AggregateResult>, ApiError> {
    let window = SelectionWindow::new(
        body.hours_back.unwrap_or(state.window_defaults.hours_back),
        body.max_items.unwrap_or(state.window_defaults.max_items),
    );
    let result = state.engine.run_analysis(&body.ticker, window).await?;
    Ok(Json(result))
}

async fn analyze_text(
    State(state): State<AppState>,
    Json(body): Json<TextReq>,
) -> Result<Json<ScoredPost>, ApiError> {
    let scored = state.engine.score_single_text(&body.text).await?;
    Ok(Json(scored))
}

async fn analyze_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchReq>,
) -> Result<Json<AggregateResult>, ApiError> {
    let result = state.engine.score_multiple_texts(body.texts).await?;
    Ok(Json(result))
}
