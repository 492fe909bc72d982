// Price Aggregator - Web Server
// Read-only HTTP API over the catalog loaded at startup

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use price_aggregator::{
    load_config, render_html, search, AppConfig, Catalog, Entry, SourceSummary, CONFIG_FILE,
};

/// Shared application state; the catalog is frozen so no lock is needed
#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
    report: Arc<String>,
}

impl AppState {
    fn new(catalog: Catalog) -> Self {
        let report = render_html(&catalog);
        Self {
            catalog: Arc::new(catalog),
            report: Arc::new(report),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// Entry as served by the API; `position` is 1-based within the response
#[derive(Serialize)]
struct EntryResponse {
    position: usize,
    name: String,
    price: i64,
    weight: i64,
    source_file: String,
    unit_price: f64,
}

impl From<(usize, &Entry)> for EntryResponse {
    fn from((idx, entry): (usize, &Entry)) -> Self {
        Self {
            position: idx + 1,
            name: entry.name().to_string(),
            price: entry.price(),
            weight: entry.weight(),
            source_file: entry.source_file().to_string(),
            unit_price: entry.unit_price(),
        }
    }
}

fn to_response<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Vec<EntryResponse> {
    entries.into_iter().enumerate().map(EntryResponse::from).collect()
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/entries - Whole catalog, ascending by unit price
async fn get_entries(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(to_response(state.catalog.iter())))
}

/// GET /api/search?q=... - Case-insensitive name search
async fn search_entries(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let matches = search(&state.catalog, &params.q);
    Json(ApiResponse::ok(to_response(matches)))
}

/// GET /api/sources - Per-file summary
async fn get_sources(State(state): State<AppState>) -> impl IntoResponse {
    let summary: Vec<SourceSummary> = state.catalog.source_summary();
    Json(ApiResponse::ok(summary))
}

/// GET /api/sources/:filename - Entries from one source file
async fn get_source_entries(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    let entries = to_response(state.catalog.iter().filter(|e| e.source_file() == filename));

    if entries.is_empty() {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(entries, format!("unknown source file: {}", filename))),
        )
            .into_response()
    } else {
        (StatusCode::OK, Json(ApiResponse::ok(entries))).into_response()
    }
}

/// GET /report - The static HTML report
async fn serve_report(State(state): State<AppState>) -> impl IntoResponse {
    Html(state.report.as_str().to_owned())
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/entries", get(get_entries))
        .route("/search", get(search_entries))
        .route("/sources", get(get_sources))
        .route("/sources/:filename", get(get_source_entries))
        .with_state(state.clone());

    Router::new()
        .route("/report", get(serve_report))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match load_config(std::path::Path::new(CONFIG_FILE)) {
        Ok(config) => config,
        Err(e) => {
            error!("Config load error: {:#}", anyhow::Error::from(e));
            std::process::exit(1);
        }
    };

    let catalog = match load(&config) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let app = router(AppState::new(catalog));

    let listener = match tokio::net::TcpListener::bind(&config.server_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", config.server_addr, e);
            std::process::exit(1);
        }
    };

    info!("Server running on http://{}", config.server_addr);
    info!("API: /api/entries, /api/search?q=..., /api/sources; report: /report");

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn load(config: &AppConfig) -> anyhow::Result<Catalog> {
    use anyhow::Context;

    Catalog::load_with_options(&config.root_dir, &config.loader_options())
        .with_context(|| format!("Failed to load price lists from {}", config.root_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn state() -> AppState {
        let entry = |name: &str, price, weight, file: &str| {
            Entry::new(name.to_string(), price, weight, file.to_string(), 2).unwrap()
        };
        AppState::new(Catalog::from_entries(vec![
            entry("Сахар", 80, 2, "price1.csv"),
            entry("Мука", 60, 1, "price2.csv"),
            entry("Молоко 1л", 90, 1, "price2.csv"),
        ]))
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_entries_in_catalog_order() {
        let (status, body) = get_json("/api/entries").await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Сахар", "Мука", "Молоко 1л"]);
        assert_eq!(body["data"][0]["unit_price"], 40.0);
        assert_eq!(body["data"][0]["position"], 1);
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let (status, body) = get_json("/api/search?q=%D0%BC%D0%BE%D0%BB%D0%BE%D0%BA%D0%BE").await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["name"], "Молоко 1л");
    }

    #[tokio::test]
    async fn test_unknown_source_is_404() {
        let (status, body) = get_json("/api/sources/nope.csv").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_source_entries() {
        let (status, body) = get_json("/api/sources/price2.csv").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_report_matches_renderer() {
        let state = state();
        let expected = render_html(&state.catalog);

        let response = router(state)
            .oneshot(Request::builder().uri("/report").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), expected);
    }
}
