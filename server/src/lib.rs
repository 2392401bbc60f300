use anyhow::Result;
use axum::{extract::{RawQuery, State}, http::StatusCode, response::{IntoResponse, Response}, routing::get, Json, Router};
use boolsearch_core::persist::load_index;
use boolsearch_core::query::{render, to_postfix_bytes};
use boolsearch_core::{AnalyzerConfig, DocId, Evaluator, InvertedIndex, Normalizer, SearchError, SnowballAnalyzer};
use percent_encoding::percent_decode;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub postfix: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub doc_ids: Vec<DocId>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub query: String,
    pub error: String,
    pub kind: &'static str,
    pub total_hits: usize,
}

/// Read-only serving state. The index is never mutated after load.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<InvertedIndex>,
    pub normalizer: Arc<dyn Normalizer>,
}

pub fn build_app<P: AsRef<Path>>(index_path: P, analyzer: AnalyzerConfig) -> Result<Router> {
    let index = load_index(index_path)?;
    Ok(router(AppState { index: Arc::new(index), normalizer: Arc::new(SnowballAnalyzer::new(analyzer)) }))
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
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Decodes the `q` parameter to raw bytes. Invalid UTF-8 is left for the
/// query compiler to reject instead of being replaced.
fn query_param(raw: &str, name: &str) -> Vec<u8> {
    for pair in raw.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode_component(key) == name.as_bytes() {
            return decode_component(value);
        }
    }
    Vec::new()
}

fn decode_component(s: &str) -> Vec<u8> {
    let spaced = s.replace('+', " ");
    percent_decode(spaced.as_bytes()).collect()
}

pub async fn search_handler(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let start = std::time::Instant::now();
    let q = query_param(raw.as_deref().unwrap_or(""), "q");
    let shown = String::from_utf8_lossy(&q).into_owned();
    let outcome = to_postfix_bytes(&q).and_then(|postfix| {
        let ids = Evaluator::new(&state.index, state.normalizer.as_ref()).evaluate(&postfix)?;
        Ok((postfix, ids))
    });

    match outcome {
        Ok((postfix, doc_ids)) => {
            let elapsed = start.elapsed();
            Json(SearchResponse {
                query: shown,
                postfix: render(&postfix),
                took_s: elapsed.as_secs_f64(),
                total_hits: doc_ids.len(),
                doc_ids,
            })
            .into_response()
        }
        Err(e) => {
            tracing::warn!(query = %shown, error = %e, "query rejected");
            let status = if e.is_query_error() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
            error_response(status, shown, &e)
        }
    }
}

fn error_response(status: StatusCode, query: String, e: &SearchError) -> Response {
    (status, Json(ErrorResponse { query, error: e.to_string(), kind: e.kind(), total_hits: 0 })).into_response()
}
