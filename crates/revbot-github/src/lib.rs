//! Revbot GitHub - GitHub REST API integration
//!
//! This crate provides the GitHub side of the review flow:
//! - Pull request file listings
//! - Repository content fetching and recursive listing
//! - Issue comments and pull request creation

pub mod client;

pub use client::{parse_repo_url, ChangedFile, GitHubClient, NewPullRequest};
