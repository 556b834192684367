use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use search_core::persist::{load_meta, MetaFile};
use search_core::{DocType, EngineConfig, SearchEngine, SortOrder, StructuredQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    /// Order article hits by publication date.
    #[serde(default)]
    pub sort: Option<SortOrder>,
}

#[derive(Deserialize)]
pub struct AnalyzeParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub doc_type: DocType,
    pub took_s: f64,
    /// False when nothing in the query was recognized.
    pub constrained: bool,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    pub analyzed: StructuredQuery,
}

/// An article id with its stored attributes, or a section / bulletin label.
#[derive(Serialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rubrique: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub num_docs: usize,
    pub meta: Option<MetaFile>,
}

#[derive(Clone)]
pub struct AppState {
    engine: Arc<RwLock<Arc<SearchEngine>>>,
    config: Arc<EngineConfig>,
    admin_token: Option<String>,
}

impl AppState {
    pub fn new(engine: SearchEngine, config: EngineConfig, admin_token: Option<String>) -> Self {
        Self { engine: Arc::new(RwLock::new(Arc::new(engine))), config: Arc::new(config), admin_token }
    }

    /// The engine currently serving queries. Reloads swap it without waiting
    /// for in-flight queries.
    pub fn engine(&self) -> Arc<SearchEngine> {
        self.engine.read().clone()
    }
}

type ApiError = (StatusCode, String);

fn internal<E: std::fmt::Display>(e: E) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Load the engine described by `config` and build the router.
pub fn build_app(config: EngineConfig) -> Result<Router> {
    let engine = SearchEngine::open(&config)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(AppState::new(engine, config, admin_token)))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .route("/analyze", get(analyze_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let meta = load_meta(&state.config.paths()).ok();
    Json(HealthResponse { status: "ok", num_docs: state.engine().num_docs(), meta })
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let engine = state.engine();
    let start = std::time::Instant::now();
    let SearchParams { q, sort } = params;
    let response = tokio::task::spawn_blocking(move || -> search_core::Result<SearchResponse> {
        let analyzed = engine.analyze(&q);
        let result = engine.execute(&analyzed)?;
        let constrained = result.ids.is_some();
        let ids = result.ids.unwrap_or_default();
        let ordered: Vec<String> = match (result.doc_type, sort) {
            (DocType::Article, Some(order)) => engine.sort_by_date(&ids, order),
            _ => ids.into_iter().collect(),
        };
        let results: Vec<SearchHit> = ordered
            .into_iter()
            .map(|id| match (result.doc_type, engine.attributes(&id)) {
                (DocType::Article, Some(attrs)) => SearchHit {
                    date: attrs.date.clone(),
                    rubrique: attrs.rubrique.clone(),
                    numero: attrs.numero.clone(),
                    id,
                },
                _ => SearchHit { id, date: None, rubrique: None, numero: None },
            })
            .collect();
        Ok(SearchResponse {
            query: q,
            doc_type: result.doc_type,
            took_s: 0.0,
            constrained,
            total_hits: results.len(),
            results,
            analyzed,
        })
    })
    .await
    .map_err(internal)?
    .map_err(internal)?;

    let took_s = start.elapsed().as_secs_f64();
    tracing::info!(query = %response.query, hits = response.total_hits, took_s, "search");
    Ok(Json(SearchResponse { took_s, ..response }))
}

pub async fn analyze_handler(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<StructuredQuery>, ApiError> {
    let engine = state.engine();
    let analyzed = tokio::task::spawn_blocking(move || engine.analyze(&params.q)).await.map_err(internal)?;
    Ok(Json(analyzed))
}

/// Reload index and lexicon from disk and swap them in.
pub async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let config = state.config.clone();
    let engine = tokio::task::spawn_blocking(move || SearchEngine::open(&config))
        .await
        .map_err(internal)?
        .map_err(internal)?;
    let num_docs = engine.num_docs();
    *state.engine.write() = Arc::new(engine);
    tracing::info!(num_docs, "engine reloaded");
    Ok(Json(serde_json::json!({ "reloaded": true, "num_docs": num_docs })))
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
