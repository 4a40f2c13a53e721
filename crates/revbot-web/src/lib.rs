//! Revbot Web - HTTP surface of the review relay
//!
//! This crate provides the web interface:
//! - GitHub webhook receiver for pull request events
//! - Manual code-review and repository file-listing endpoints
//! - Background auto-PR worker that turns suggestions into pull requests

pub mod api;
pub mod auto_pr;
pub mod review;
pub mod webhook;

pub use api::{create_router, ApiError, AppState};
pub use auto_pr::{AutoPrJob, AutoPrWorker, AutoPrWorkerConfig};
pub use webhook::{WebhookConfig, WebhookResponse};
