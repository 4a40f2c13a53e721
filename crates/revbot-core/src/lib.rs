//! Revbot Core - shared types for the code review relay
//!
//! This crate provides the pieces every other crate leans on:
//! - Process configuration assembled at startup
//! - The error enum and `Result` alias
//! - Prompt construction for diff and whole-file reviews
//! - Suggestion parsing (delimiter splitting, code-fence stripping)

pub mod config;
pub mod error;
pub mod prompt;
pub mod suggestion;

pub use config::Config;
pub use error::{Error, Result};
pub use prompt::{file_review_prompt, patch_review_prompt};
pub use suggestion::{split_suggestion, strip_code_fences, FileSuggestion, SUGGESTION_DELIMITER};
