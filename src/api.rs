//! HTTP surface: source/keyword management, discovered items, mining control.
//!
//! Thin handlers over `Store` and `MiningScheduler`. Response field names
//! match what the desktop client already reads.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::MinerError;
use crate::ingest::scheduler::{MiningScheduler, StartOutcome, StopOutcome};
use crate::model::{NewSource, SourceUpdate};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub scheduler: MiningScheduler,
    pub port: u16,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/status", get(status))
        .route("/api/sources", get(list_sources).post(add_source))
        .route("/api/sources/{id}", put(update_source).delete(delete_source))
        .route("/api/keywords", get(list_keywords).post(add_keyword))
        .route("/api/keywords/{id}", axum::routing::delete(delete_keyword))
        .route("/api/discovered", get(list_discovered))
        .route("/api/mine", post(start_mining))
        .route("/api/mine/stop", post(stop_mining))
        .route("/api/mine/once", post(mine_once))
        .route("/api/config", get(get_config).post(update_config))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON error body with a status derived from the error kind.
pub struct ApiError(MinerError);

impl From<MinerError> for ApiError {
    fn from(e: MinerError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self(MinerError::Validation(r.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MinerError::Validation(_) | MinerError::DuplicateKeyword(_) => StatusCode::BAD_REQUEST,
            MinerError::NotFound { .. } => StatusCode::NOT_FOUND,
            MinerError::Busy(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "mining_active": state.scheduler.is_running(),
        "mining_phase": state.scheduler.phase(),
        "interval_hours": state.scheduler.interval_hours(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn list_sources(State(state): State<AppState>) -> ApiResult {
    let sources = state.store.list_sources().await?;
    Ok(Json(json!({ "sources": sources })))
}

async fn add_source(
    State(state): State<AppState>,
    payload: Result<Json<NewSource>, JsonRejection>,
) -> ApiResult {
    let Json(new) = payload?;
    let source = state.store.create_source(new).await?;
    Ok(Json(json!({ "id": source.id, "message": "source added" })))
}

async fn update_source(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<SourceUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(update) = payload?;
    let source = state.store.update_source(id, update).await?;
    Ok(Json(json!({ "message": "source updated", "source": source })))
}

async fn delete_source(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult {
    state.store.delete_source(id).await?;
    Ok(Json(json!({ "message": "source deleted" })))
}

async fn list_keywords(State(state): State<AppState>) -> ApiResult {
    let keywords = state.store.list_keywords().await?;
    Ok(Json(json!({ "keywords": keywords })))
}

#[derive(Deserialize)]
struct AddKeywordReq {
    #[serde(default)]
    keyword: String,
}

async fn add_keyword(
    State(state): State<AppState>,
    payload: Result<Json<AddKeywordReq>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let kw = state.store.add_keyword(&req.keyword).await?;
    Ok(Json(json!({ "id": kw.id, "message": "keyword added" })))
}

async fn delete_keyword(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult {
    state.store.delete_keyword(id).await?;
    Ok(Json(json!({ "message": "keyword deleted" })))
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

async fn list_discovered(State(state): State<AppState>, Query(q): Query<PageQuery>) -> ApiResult {
    let info = state.store.list_discovered(q.limit, q.offset).await?;
    Ok(Json(json!({ "info": info })))
}

async fn start_mining(State(state): State<AppState>) -> Json<Value> {
    let outcome = state.scheduler.start();
    let message = match outcome {
        StartOutcome::Started => "mining started",
        StartOutcome::AlreadyRunning => "mining is already running",
        StartOutcome::Restarted => "mining restarted; the previous cycle is finishing",
    };
    Json(json!({ "message": message, "outcome": outcome }))
}

async fn stop_mining(State(state): State<AppState>) -> Json<Value> {
    let outcome = state.scheduler.stop();
    let message = match outcome {
        StopOutcome::Stopping => "mining stopped",
        StopOutcome::NotRunning => "no mining task is running",
    };
    Json(json!({ "message": message, "outcome": outcome }))
}

async fn mine_once(State(state): State<AppState>) -> ApiResult {
    let report = state.scheduler.run_once().await?;
    Ok(Json(json!({ "message": "mining cycle finished", "report": report })))
}

async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "mining_interval": state.scheduler.interval_hours(),
        "port": state.port,
    }))
}

#[derive(Deserialize)]
struct ConfigUpdate {
    mining_interval: Option<f64>,
}

async fn update_config(
    State(state): State<AppState>,
    payload: Result<Json<ConfigUpdate>, JsonRejection>,
) -> ApiResult {
    let Json(update) = payload?;
    if let Some(hours) = update.mining_interval {
        state.scheduler.set_interval(hours)?;
    }
    Ok(Json(json!({ "message": "config updated" })))
}
