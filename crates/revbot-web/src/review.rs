//! Manual code-review endpoint
//!
//! Reviews a caller-supplied list of repository files and optionally queues
//! an auto-PR with the suggested changes.

use axum::{extract::State, Json};
use revbot_core::{file_review_prompt, FileSuggestion};
use revbot_github::parse_repo_url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::{ApiError, AppState};
use crate::auto_pr::AutoPrJob;

#[derive(Debug, Deserialize)]
pub struct CodeReviewRequest {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    /// Raw JSON so shape problems map to a validation error instead of a
    /// body rejection.
    #[serde(default)]
    pub context_files: Value,
    #[serde(default)]
    pub create_pr: bool,
    #[serde(rename = "baseBranch", default = "default_base_branch")]
    pub base_branch: String,
}

fn default_base_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Serialize)]
pub struct CodeReviewResponse {
    pub results: Vec<Vec<String>>,
}

/// Manual code-review handler
///
/// Fetches each context file, requests a suggestion for it and returns the
/// delimiter-split sections per file. Files that cannot be fetched are
/// logged and left out of the results; empty files yield an empty
/// suggestion without a completion call.
pub async fn code_review_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CodeReviewRequest>,
) -> Result<Json<CodeReviewResponse>, ApiError> {
    let files = parse_context_files(&request.context_files).map_err(ApiError::validation)?;
    let repo_url = request
        .repo_url
        .as_deref()
        .ok_or_else(|| ApiError::validation("repo_url is required"))?;
    let (owner, repo) =
        parse_repo_url(repo_url).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let project_name = request.project_name.as_deref().unwrap_or(repo.as_str());

    info!(
        owner = %owner,
        repo = %repo,
        files = files.len(),
        create_pr = request.create_pr,
        "Manual code review requested"
    );

    let mut suggestions: Vec<FileSuggestion> = Vec::with_capacity(files.len());
    for path in &files {
        let content = match state.github.fetch_file_content(&owner, &repo, path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %path, error = %e, "Skipping file that could not be fetched");
                continue;
            }
        };

        let raw = if content.is_empty() {
            String::new()
        } else {
            let prompt = file_review_prompt(project_name, repo_url, path, &content);
            state.openai.complete_or_empty(&prompt).await
        };

        suggestions.push(FileSuggestion::new(path.as_str(), &raw));
    }

    let results = suggestions.iter().map(|s| s.segments.clone()).collect();

    if request.create_pr {
        let job = AutoPrJob::new(repo_url, &request.base_branch, suggestions);
        match state.pr_jobs.try_send(job) {
            Ok(()) => info!(repo = %repo, "Auto-PR job queued"),
            Err(e) => error!(error = %e, "Failed to queue auto-PR job"),
        }
    }

    Ok(Json(CodeReviewResponse { results }))
}

/// Validates the `context_files` payload: a non-empty array of path strings.
fn parse_context_files(value: &Value) -> Result<Vec<String>, String> {
    let items = value
        .as_array()
        .ok_or_else(|| "context_files must be an array of file paths".to_string())?;
    if items.is_empty() {
        return Err("context_files must not be empty".to_string());
    }
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| "context_files entries must be strings".to_string())
        })
        .collect()
}
