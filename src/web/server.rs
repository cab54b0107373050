//! Web server for traffic graph visualization
//!
//! Provides an HTTP server using Axum to serve the viewer page
//! and JSON API endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::graph::TrafficGraph;

use super::routes;

/// Shared application state
pub struct AppState {
    pub graph: TrafficGraph,
    pub sources: Vec<String>,
    pub top: usize,
}

/// Configuration for the web server
pub struct ServerConfig {
    pub port: u16,
    pub open_browser: bool,
    /// Allow cross-origin requests (for tooling served from elsewhere)
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            open_browser: true,
            cors: false,
        }
    }
}

/// Build the router for the given state
pub fn app(state: Arc<AppState>, cors: bool) -> Router {
    let router = Router::new()
        .merge(routes::api_routes())
        .merge(routes::static_routes())
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Start the web server and serve the graph
pub async fn start_server(
    graph: TrafficGraph,
    sources: Vec<String>,
    top: usize,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = Arc::new(AppState {
        graph,
        sources,
        top,
    });

    let app = app(state, config.cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;

    let url = format!("http://localhost:{}", config.port);
    tracing::info!("Starting web server at {}", url);

    if config.open_browser {
        if let Err(e) = open::that(&url) {
            tracing::warn!("Could not open browser: {}. Please open {} manually", e, url);
        }
    }

    eprintln!("Serving graph at {} (press Ctrl+C to stop)", url);

    axum::serve(listener, app).await?;

    Ok(())
}
