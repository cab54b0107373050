//! HTTP routes for the web visualization
//!
//! Provides API endpoints for graph data and static file serving.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};

use crate::cli_output::{RunSummary, summarize};
use crate::output::{EdgeColumns, NodeColumns};

use super::graph::{self, GraphData};
use super::server::AppState;

/// Embedded static assets
#[derive(RustEmbed)]
#[folder = "web-assets/"]
struct Assets;

/// Both tables in columnar layout
#[derive(Serialize)]
struct TablesResponse<'a> {
    nodes: NodeColumns<'a>,
    edges: EdgeColumns,
}

/// Query parameters for host lookup
#[derive(Deserialize)]
struct HostQuery {
    id: String,
}

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/graph", get(get_graph))
        .route("/api/tables", get(get_tables))
        .route("/api/summary", get(get_summary))
        .route("/api/host", get(get_host))
        .route("/api/health", get(health_check))
}

/// Create static file routes
pub fn static_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index_html))
        .route("/{*path}", get(static_handler))
}

/// GET /api/graph - Returns the complete traffic graph
async fn get_graph(State(state): State<Arc<AppState>>) -> Json<GraphData> {
    Json(graph::traffic_to_graph(
        &state.graph,
        &state.sources,
        state.top,
    ))
}

/// GET /api/tables - Returns the node and edge tables
async fn get_tables(State(state): State<Arc<AppState>>) -> Response {
    Json(TablesResponse {
        nodes: NodeColumns::from_graph(&state.graph),
        edges: EdgeColumns::from_graph(&state.graph),
    })
    .into_response()
}

/// GET /api/summary - Returns counts and top talkers
async fn get_summary(State(state): State<Arc<AppState>>) -> Json<RunSummary> {
    Json(summarize(&state.graph, &state.sources, state.top))
}

/// GET /api/host?id=... - Returns one host and its edges
async fn get_host(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HostQuery>,
) -> impl IntoResponse {
    let Some(index) = state.graph.index_of(&query.id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("Host '{}' not found", query.id)})),
        )
            .into_response();
    };

    let traffic = &state.graph.host_traffic()[index];
    let edges: Vec<_> = state
        .graph
        .edges()
        .iter()
        .filter(|e| e.source == index || e.target == index)
        .map(|e| {
            let peer = if e.source == index { e.target } else { e.source };
            serde_json::json!({
                "peer": state.graph.host(peer),
                "peer_index": peer,
                "weight": e.weight,
            })
        })
        .collect();

    Json(serde_json::json!({
        "id": traffic.id,
        "index": traffic.index,
        "bytes": traffic.bytes,
        "degree": traffic.degree,
        "edges": edges,
    }))
    .into_response()
}

/// GET /api/health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// GET / - Serve index.html
async fn index_html() -> impl IntoResponse {
    match Assets::get("index.html") {
        Some(content) => Html(content.data.into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

/// Static file handler for embedded assets
async fn static_handler(
    axum::extract::Path(path): axum::extract::Path<String>,
) -> impl IntoResponse {
    let path = path.trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response(),
    }
}
