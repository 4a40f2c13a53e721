//! REST API endpoints and route wiring

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use revbot_github::{parse_repo_url, GitHubClient};
use revbot_openai::OpenAiClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::auto_pr::AutoPrJob;
use crate::webhook::WebhookConfig;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl ApiError {
    pub(crate) fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: "bad_request".to_string(),
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: "validation_error".to_string(),
        }
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            code: "internal_error".to_string(),
        }
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub github: GitHubClient,
    pub openai: OpenAiClient,
    pub webhook: WebhookConfig,
    pub pr_jobs: mpsc::Sender<AutoPrJob>,
}

impl AppState {
    pub fn new(
        github: GitHubClient,
        openai: OpenAiClient,
        webhook: WebhookConfig,
        pr_jobs: mpsc::Sender<AutoPrJob>,
    ) -> Self {
        Self {
            github,
            openai,
            webhook,
            pr_jobs,
        }
    }
}

/// Create the router with all review endpoints
///
/// `/mcp/context` and `/mcp/files` are aliases kept for callers that still
/// use the old tool-style paths.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(crate::webhook::github_webhook_handler))
        .route(
            "/repositories/code-review",
            post(crate::review::code_review_handler),
        )
        .route("/mcp/context", post(crate::review::code_review_handler))
        .route("/repositories/files", get(list_files_handler))
        .route("/mcp/files", post(list_files_body_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ==================== Handlers ====================

async fn health_check() -> &'static str {
    "AI code review server running."
}

#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    pub repo_url: Option<String>,
    /// Comma-separated suffix filter, e.g. ".js,.ts"
    pub extensions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesRequest {
    pub repo_url: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

async fn list_files_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    let extensions = query.extensions.map(split_extensions).unwrap_or_default();
    list_files(&state, query.repo_url.as_deref(), &extensions).await
}

async fn list_files_body_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ListFilesRequest>,
) -> Result<Json<FileListResponse>, ApiError> {
    list_files(&state, request.repo_url.as_deref(), &request.extensions).await
}

async fn list_files(
    state: &AppState,
    repo_url: Option<&str>,
    extensions: &[String],
) -> Result<Json<FileListResponse>, ApiError> {
    let repo_url = repo_url.ok_or_else(|| ApiError::validation("repo_url is required"))?;
    let (owner, repo) =
        parse_repo_url(repo_url).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let files = state
        .github
        .list_files_recursive(&owner, &repo, "", extensions)
        .await
        .map_err(|e| {
            error!(owner = %owner, repo = %repo, error = %e, "Failed to list repository files");
            ApiError::internal("Could not list repository files")
        })?;

    Ok(Json(FileListResponse { files }))
}

fn split_extensions(csv: String) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
