//! GitHub webhook receiver
//!
//! Receives pull request events, verifies signatures when a secret is
//! configured, and drives the per-file review loop.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use revbot_core::{patch_review_prompt, Result};
use revbot_github::ChangedFile;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::AppState;

const NOT_RELEVANT_MESSAGE: &str = "Event received, not relevant for review.";
const REVIEW_STARTED_MESSAGE: &str = "PR received. Review in progress...";

/// Webhook configuration
#[derive(Clone)]
pub struct WebhookConfig {
    /// GitHub webhook secret for HMAC verification
    pub secret: Option<String>,
}

impl WebhookConfig {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }
}

/// Webhook response
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
}

/// GitHub webhook handler
///
/// Reviews every changed file of opened and synchronized pull requests.
/// Anything else is acknowledged with 200 so GitHub does not retry the
/// delivery, including payloads that fail to parse.
pub async fn github_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let event_type = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    // Verify signature if a secret is configured
    if let Some(ref secret) = state.webhook.secret {
        let signature = match headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok())
        {
            Some(value) => value,
            None => {
                warn!(event_type = %event_type, "Missing X-Hub-Signature-256 header");
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(WebhookResponse {
                        status: "error".to_string(),
                        message: "Missing signature".to_string(),
                    }),
                );
            }
        };

        if !verify_signature(secret, &body, signature) {
            error!(event_type = %event_type, "Invalid webhook signature");
            return (
                StatusCode::UNAUTHORIZED,
                Json(WebhookResponse {
                    status: "error".to_string(),
                    message: "Invalid signature".to_string(),
                }),
            );
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(event_type = %event_type, error = %e, "Ignoring webhook with unparseable payload");
            return ok_response(NOT_RELEVANT_MESSAGE);
        }
    };

    let action = payload.get("action").and_then(|v| v.as_str()).unwrap_or("");
    if !is_relevant_pr_event(&event_type, action) {
        debug!(event_type = %event_type, action = %action, "Ignoring event not relevant for review");
        return ok_response(NOT_RELEVANT_MESSAGE);
    }

    let Some(pr) = PrCoordinates::from_payload(&payload) else {
        warn!(event_type = %event_type, action = %action, "Pull request payload missing coordinates");
        return ok_response(NOT_RELEVANT_MESSAGE);
    };

    info!(
        owner = %pr.owner,
        repo = %pr.repo,
        pr_number = pr.number,
        action = %action,
        "Reviewing pull request"
    );

    if let Err(e) = review_pull_request(&state, &pr).await {
        error!(
            owner = %pr.owner,
            repo = %pr.repo,
            pr_number = pr.number,
            error = %e,
            "Failed to review pull request"
        );
    }

    ok_response(REVIEW_STARTED_MESSAGE)
}

fn ok_response(message: &str) -> (StatusCode, Json<WebhookResponse>) {
    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "ok".to_string(),
            message: message.to_string(),
        }),
    )
}

/// Review relevance gate: only opened and updated pull requests get reviewed.
fn is_relevant_pr_event(event_type: &str, action: &str) -> bool {
    event_type == "pull_request" && matches!(action, "opened" | "synchronize")
}

#[derive(Debug, Clone, PartialEq)]
struct PrCoordinates {
    owner: String,
    repo: String,
    number: u64,
}

impl PrCoordinates {
    fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        let number = payload.get("pull_request")?.get("number")?.as_u64()?;
        let repository = payload.get("repository")?;
        let repo = repository.get("name")?.as_str()?;
        let owner = repository.get("owner")?.get("login")?.as_str()?;
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
        })
    }
}

/// Reviews every changed file that carries a patch.
///
/// A file whose review fails is logged and skipped; the rest of the batch
/// still runs.
async fn review_pull_request(state: &AppState, pr: &PrCoordinates) -> Result<()> {
    let changed = state
        .github
        .list_changed_files(&pr.owner, &pr.repo, pr.number)
        .await?;

    info!(pr_number = pr.number, files = changed.len(), "Listed changed files");

    for file in changed {
        let Some(patch) = reviewable_patch(&file) else {
            debug!(file = %file.filename, "Skipping file without a patch");
            continue;
        };

        if let Err(e) = review_changed_file(state, pr, &file.filename, patch).await {
            warn!(file = %file.filename, error = %e, "Failed to review file, continuing");
        }
    }

    Ok(())
}

/// Only files GitHub provides a non-empty diff for get reviewed; binary and
/// renamed files come through without one.
fn reviewable_patch(file: &ChangedFile) -> Option<&str> {
    file.patch.as_deref().filter(|p| !p.is_empty())
}

async fn review_changed_file(
    state: &AppState,
    pr: &PrCoordinates,
    filename: &str,
    patch: &str,
) -> Result<()> {
    let prompt = patch_review_prompt(filename, patch);
    let review = state.openai.complete(&prompt).await?;
    let comment = format_review_comment(filename, &review);
    state
        .github
        .post_issue_comment(&pr.owner, &pr.repo, pr.number, &comment)
        .await
}

fn format_review_comment(filename: &str, review: &str) -> String {
    format!("💡 Review of **{filename}**:\n\n{review}")
}

/// Verify GitHub webhook signature using HMAC-SHA256
///
/// GitHub sends the signature in the format: "sha256=<hex-encoded-hmac>"
fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let signature = match signature.strip_prefix("sha256=") {
        Some(sig) => sig,
        None => {
            warn!("Signature doesn't start with 'sha256='");
            return false;
        }
    };

    let expected_signature = match hex::decode(signature) {
        Ok(sig) => sig,
        Err(e) => {
            warn!(error = %e, "Failed to decode signature hex");
            return false;
        }
    };

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, "Failed to create HMAC");
            return false;
        }
    };
    mac.update(payload);

    mac.verify_slice(&expected_signature).is_ok()
}
