//! HTTP API.
//!
//! Every test-case route re-runs the upstream search; nothing is cached
//! between requests. Outbound calls for one inbound request are made one at a
//! time.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/health` | Liveness check |
//! | `GET` | `/api/test-cases` | All test cases |
//! | `GET` | `/api/test-cases/detailed` | All test cases with table contents |
//! | `GET` | `/api/test-cases/{key}/blocks` | A test case's blocks (`?type=table` for tables only) |
//! | `GET` | `/api/blocks/{id}` | One projected block |
//! | `GET` | `/api/blocks/{id}/table` | One reconstructed table |
//!
//! # Envelopes
//!
//! Success:
//!
//! ```json
//! { "success": true, "data": ..., "message": "Test cases retrieved successfully" }
//! ```
//!
//! Failure (400 for a missing or malformed parameter or a non-table block,
//! 404 for an unknown key or route, 500 for upstream and decode failures):
//!
//! ```json
//! { "error": "Test case not found", "message": "test case with key 01001 not found" }
//! ```

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::blocks::{get_block_details, NormalizedBlock};
use crate::client::{DocumentApi, NotionClient};
use crate::config::Config;
use crate::error::Error;
use crate::tables::{get_table_data, TableSnapshot};
use crate::testcases::{
    get_detailed_test_cases, get_test_case_blocks, search_test_cases, DetailedTestCase, TestCase,
    TestCaseBlocks,
};

/// Shared state handed to every route handler.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    api: Arc<dyn DocumentApi>,
}

/// Start the HTTP API against the configured upstream.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    if config.notion.api_key.is_empty() {
        warn!("NOTION_API_KEY is not set; upstream requests will be rejected");
    }
    let api: Arc<dyn DocumentApi> = Arc::new(NotionClient::new(&config.notion)?);
    run_server_with_api(config, api).await
}

/// Start the HTTP API with a caller-supplied [`DocumentApi`].
pub async fn run_server_with_api(
    config: &Config,
    api: Arc<dyn DocumentApi>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(Arc::new(config.clone()), api);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router.
pub fn router(config: Arc<Config>, api: Arc<dyn DocumentApi>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/test-cases", get(handle_test_cases))
        .route("/api/test-cases/detailed", get(handle_detailed))
        .route("/api/test-cases/{key}/blocks", get(handle_test_case_blocks))
        .route("/api/blocks/{id}", get(handle_block))
        .route("/api/blocks/{id}/table", get(handle_table))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { config, api })
}

// ============ Envelopes ============

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    message: String,
}

fn ok<T: Serialize>(data: T, message: &str) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
        message: message.to_string(),
    })
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(error: &str, message: &str) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        error: error.to_string(),
        message: message.to_string(),
    }
}

/// Map a library error onto its HTTP status with a route-specific label.
fn upstream_error(label: &str, err: Error) -> AppError {
    let status = err.status_code();
    if status.is_server_error() {
        error!(category = err.category(), error = %err, "{}", label);
    }
    AppError {
        status,
        error: label.to_string(),
        message: err.to_string(),
    }
}

async fn handle_not_found(uri: Uri) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        error: "Not found".to_string(),
        message: format!("no route for {}", uri.path()),
    }
}

// ============ GET /api/health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
    })
}

// ============ GET /api/test-cases ============

async fn handle_test_cases(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TestCase>>>, AppError> {
    let test_cases = search_test_cases(state.api.as_ref(), &state.config.catalog)
        .await
        .map_err(|e| upstream_error("Failed to search test cases", e))?;

    Ok(ok(test_cases, "Test cases retrieved successfully"))
}

// ============ GET /api/test-cases/detailed ============

async fn handle_detailed(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<DetailedTestCase>>>, AppError> {
    let detailed = get_detailed_test_cases(state.api.as_ref(), &state.config.catalog)
        .await
        .map_err(|e| upstream_error("Failed to get detailed test cases", e))?;

    Ok(ok(detailed, "Detailed test cases retrieved successfully"))
}

// ============ GET /api/test-cases/{key}/blocks ============

#[derive(Deserialize)]
struct BlocksQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn handle_test_case_blocks(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<BlocksQuery>,
) -> Result<Json<ApiResponse<TestCaseBlocks>>, AppError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(bad_request("Missing test case key", "Test case key is required"));
    }

    let tables_only = query.kind.as_deref() == Some("table");
    let catalog = &state.config.catalog;
    let blocks = get_test_case_blocks(state.api.as_ref(), catalog, key, tables_only)
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => upstream_error("Test case not found", e),
            other => upstream_error("Failed to get blocks", other),
        })?;

    Ok(ok(blocks, "Blocks retrieved successfully"))
}

// ============ GET /api/blocks/{id} ============

async fn handle_block(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NormalizedBlock>>, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(bad_request("Missing block ID", "Block ID is required"));
    }

    let block = get_block_details(state.api.as_ref(), id)
        .await
        .map_err(|e| upstream_error("Failed to get block details", e))?;

    Ok(ok(block, "Block details retrieved successfully"))
}

// ============ GET /api/blocks/{id}/table ============

async fn handle_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TableSnapshot>>, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(bad_request("Missing block ID", "Block ID is required"));
    }

    let table = get_table_data(state.api.as_ref(), id)
        .await
        .map_err(|e| upstream_error("Failed to get table data", e))?;

    Ok(ok(table, "Table data retrieved successfully"))
}
