use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use forkdex_core::{DocId, Error as CoreError, Hit, SearchEngine, SearchMode};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

type ApiError = (StatusCode, Json<serde_json::Value>);

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeParam {
    Boolean,
    #[default]
    Ranked,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub mode: ModeParam,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 5 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: ModeParam,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<Hit>,
}

/// The loaded snapshot is swapped whole on reload; handlers clone the `Arc`
/// and never hold the lock while searching.
#[derive(Clone)]
pub struct AppState {
    pub index_dir: PathBuf,
    pub engine: Arc<RwLock<Arc<SearchEngine>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Load the snapshot once; every handler shares it from here on.
    pub fn open(index_dir: impl Into<PathBuf>, admin_token: Option<String>) -> Result<Self> {
        let index_dir = index_dir.into();
        let engine = SearchEngine::open(&index_dir)?;
        Ok(Self { index_dir, engine: Arc::new(RwLock::new(Arc::new(engine))), admin_token })
    }

    pub fn engine(&self) -> Arc<SearchEngine> { self.engine.read().clone() }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState::open(index_dir, admin_token)?;
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn api_error(status: StatusCode, message: impl ToString) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.to_string() })))
}

fn core_error(err: CoreError) -> ApiError {
    let status = if err.is_config() {
        StatusCode::BAD_REQUEST
    } else if err.is_persistence() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    api_error(status, err)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let mode = match params.mode {
        ModeParam::Boolean => SearchMode::Boolean,
        ModeParam::Ranked => SearchMode::Ranked { k: params.k.min(MAX_K) },
    };
    let results = state.engine().search(&params.q, mode).map_err(core_error)?.into_hits();

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, hits = results.len(), took_s = elapsed.as_secs_f64(), "search");
    Ok(Json(SearchResponse { query: params.q, mode: params.mode, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine();
    let payload = engine.document(doc_id).ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not found"))?;
    let mut obj = serde_json::to_value(payload).map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    obj["doc_id"] = serde_json::Value::from(doc_id);
    Ok(Json(obj))
}

/// Replace the served snapshot with whatever is on disk now. On failure the
/// current snapshot keeps serving.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let dir = state.index_dir.clone();
    let engine = tokio::task::spawn_blocking(move || SearchEngine::open(dir))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .map_err(|e| {
            tracing::warn!(error = %e, "reload failed, keeping current snapshot");
            core_error(e)
        })?;
    let meta = engine.meta().clone();
    *state.engine.write() = Arc::new(engine);
    tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, "snapshot reloaded");
    Ok(Json(serde_json::json!({ "num_docs": meta.num_docs, "num_terms": meta.num_terms, "created_at": meta.created_at })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(api_error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(api_error(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
