use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::{Mutex, RwLock};
use search_core::{
    paginate, process_queries, process_queries_joined, remove_duplicates, DocId, Document, DocumentStatus, ErrorKind,
    ExecutionMode, RequestLog, SearchEngine, SearchError, Term,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub page: usize,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Sequential,
    Parallel,
}

impl From<Mode> for ExecutionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sequential => ExecutionMode::Sequential,
            Mode::Parallel => ExecutionMode::Parallel,
        }
    }
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub relevance: f64,
    pub rating: i32,
}

impl From<&Document> for SearchHit {
    fn from(d: &Document) -> Self { Self { doc_id: d.id, relevance: d.relevance, rating: d.rating } }
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub queries: Vec<String>,
    #[serde(default)]
    pub joined: bool,
}

#[derive(Deserialize)]
pub struct MatchParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct MatchResponse {
    pub doc_id: DocId,
    pub words: Vec<Term>,
    pub status: DocumentStatus,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub status: DocumentStatus,
    pub rating: i32,
    pub frequencies: BTreeMap<Term, f64>,
}

#[derive(Deserialize)]
pub struct NewDocument {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub document_count: usize,
    pub term_count: usize,
    pub request_window: usize,
    pub requests: usize,
    pub no_result_requests: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<SearchEngine>>,
    pub requests: Arc<Mutex<RequestLog>>,
    pub admin_token: Option<String>,
}

pub struct AppConfig {
    pub admin_token: Option<String>,
    /// Comma-separated allowed origins; any origin when unset or empty.
    pub cors_allow_origin: Option<String>,
    pub request_window: usize,
}

impl AppConfig {
    /// Reads `ADMIN_TOKEN` and `CORS_ALLOW_ORIGIN` from the environment.
    pub fn from_env() -> Self {
        Self {
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
            request_window: search_core::config::REQUEST_WINDOW,
        }
    }
}

type ApiError = (StatusCode, String);

fn api_error(err: SearchError) -> ApiError {
    let status = match err.kind() {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
    };
    (status, err.to_string())
}

pub fn build_app(engine: SearchEngine, config: AppConfig) -> Result<Router> {
    let state = AppState {
        engine: Arc::new(RwLock::new(engine)),
        requests: Arc::new(Mutex::new(RequestLog::new(config.request_window))),
        admin_token: config.admin_token,
    };

    let cors = match config.cors_allow_origin {
        Some(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/search/batch", post(batch_handler))
        .route("/stats", get(stats_handler))
        .route("/doc/:doc_id", get(doc_handler).delete(remove_handler))
        .route("/doc/:doc_id/match", get(match_handler))
        .route("/index/documents", post(add_handler))
        .route("/index/dedup", post(dedup_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let status = params.status;
    let found = state
        .engine
        .read()
        .find_top_documents_in(params.mode.into(), &params.q, |_, s, _| s == status)
        .map_err(api_error)?;
    state.requests.lock().record(&found);

    let total_hits = found.len();
    let results: Vec<SearchHit> = match params.page_size {
        Some(size) => paginate(&found, size)
            .nth(params.page)
            .map(|page| page.iter().map(SearchHit::from).collect())
            .unwrap_or_default(),
        None => found.iter().map(SearchHit::from).collect(),
    };

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn batch_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine.read();
    let body = if req.joined {
        let found = process_queries_joined(&engine, &req.queries[..]).map_err(api_error)?;
        serde_json::json!({ "results": found.iter().map(SearchHit::from).collect::<Vec<_>>() })
    } else {
        let found = process_queries(&engine, &req.queries[..]).map_err(api_error)?;
        let results: Vec<Vec<SearchHit>> = found.iter().map(|docs| docs.iter().map(SearchHit::from).collect()).collect();
        serde_json::json!({ "results": results })
    };
    Ok(Json(body))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<DocResponse>, ApiError> {
    let engine = state.engine.read();
    let (Some(status), Some(rating)) = (engine.document_status(doc_id), engine.document_rating(doc_id)) else {
        return Err(api_error(SearchError::DocumentNotFound(doc_id)));
    };
    let frequencies = engine.word_frequencies(doc_id).clone();
    Ok(Json(DocResponse { doc_id, status, rating, frequencies }))
}

pub async fn match_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
    Query(params): Query<MatchParams>,
) -> Result<Json<MatchResponse>, ApiError> {
    let (words, status) = state.engine.read().match_document(&params.q, doc_id).map_err(api_error)?;
    Ok(Json(MatchResponse { doc_id, words, status }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let (document_count, term_count) = {
        let engine = state.engine.read();
        (engine.document_count(), engine.term_count())
    };
    let requests = state.requests.lock();
    Json(StatsResponse {
        document_count,
        term_count,
        request_window: requests.capacity(),
        requests: requests.len(),
        no_result_requests: requests.no_result_requests(),
    })
}

// --- Admin endpoints ---
async fn add_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(doc): Json<NewDocument>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.engine.write().add_document(doc.id, &doc.text, doc.status, &doc.ratings).map_err(api_error)?;
    Ok(StatusCode::CREATED)
}

async fn remove_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(doc_id): Path<DocId>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers)?;
    state.engine.write().remove_document_in(ExecutionMode::Parallel, doc_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn dedup_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let removed = remove_duplicates(&mut state.engine.write());
    Ok(Json(serde_json::json!({ "removed": removed })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
