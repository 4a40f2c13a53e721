//! End-to-end tests for the review server router

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use revbot_github::GitHubClient;
use revbot_openai::{OpenAiClient, OpenAiClientConfig};
use revbot_web::{create_router, AppState, AutoPrJob, WebhookConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

fn setup(secret: Option<String>) -> (Router, mpsc::Receiver<AutoPrJob>) {
    let github = GitHubClient::with_api_url("test-token", "http://127.0.0.1:1").unwrap();
    let openai = OpenAiClient::with_config(
        "test-key",
        OpenAiClientConfig {
            base_url: "http://127.0.0.1:1/v1".to_string(),
            ..OpenAiClientConfig::default()
        },
    );
    let (pr_jobs, rx) = mpsc::channel(4);
    let router = create_router(Arc::new(AppState::new(
        github,
        openai,
        WebhookConfig::new(secret),
        pr_jobs,
    )));
    (router, rx)
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn github_signature(secret: &str, payload: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[tokio::test]
async fn test_signed_relevant_webhook_reaches_review() {
    let secret = "hook-secret";
    let (router, _rx) = setup(Some(secret.to_string()));

    let payload = serde_json::json!({
        "action": "opened",
        "pull_request": {"number": 3},
        "repository": {"name": "demo", "owner": {"login": "acme"}}
    })
    .to_string();

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/webhook")
                .header("content-type", "application/json")
                .header("x-github-event", "pull_request")
                .header("x-hub-signature-256", github_signature(secret, &payload))
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response.into_body()).await;
    assert_eq!(value["status"], "ok");
    assert_eq!(value["message"], "PR received. Review in progress...");
}

#[tokio::test]
async fn test_tampered_payload_is_rejected() {
    let secret = "hook-secret";
    let (router, _rx) = setup(Some(secret.to_string()));

    let signed = r#"{"action":"opened"}"#;
    let tampered = r#"{"action":"opened","extra":true}"#;

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/webhook")
                .header("content-type", "application/json")
                .header("x-github-event", "pull_request")
                .header("x-hub-signature-256", github_signature(secret, signed))
                .body(Body::from(tampered))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_review_with_create_pr_queues_job() {
    let (router, mut rx) = setup(None);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/repositories/code-review")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{
                        "repo_url": "https://github.com/acme/demo",
                        "context_files": ["src/a.js", "src/b.js"],
                        "create_pr": true,
                        "baseBranch": "develop"
                    }"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response.into_body()).await;
    assert_eq!(value["results"], serde_json::json!([]));

    let job = rx.try_recv().unwrap();
    assert_eq!(job.repo_url, "https://github.com/acme/demo");
    assert_eq!(job.base_branch, "develop");
    // both files failed to fetch, so the job carries no suggestions
    assert!(job.files.is_empty());
}

#[tokio::test]
async fn test_review_without_create_pr_queues_nothing() {
    let (router, mut rx) = setup(None);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/repositories/code-review")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"repo_url": "https://github.com/acme/demo", "context_files": ["src/a.js"]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(rx.try_recv().is_err());
}
