//! Suggestion parsing
//!
//! Full-file reviews ask the model for two sections separated by a fixed
//! delimiter: the revised file content, then a free-form summary. This module
//! splits completions into those sections and strips the Markdown code fences
//! models tend to wrap code in.

use serde::{Deserialize, Serialize};

/// Separator the file-review prompt asks the model to place between the
/// revised content and the summary.
pub const SUGGESTION_DELIMITER: &str = "########";

/// Splits a raw completion into its delimited sections.
///
/// Text without the delimiter yields a single section; empty text yields a
/// single empty section.
pub fn split_suggestion(text: &str) -> Vec<String> {
    text.split(SUGGESTION_DELIMITER)
        .map(|s| s.to_string())
        .collect()
}

/// Removes a wrapping Markdown code fence.
///
/// Drops an opening fence line (with any language tag) at the start of the
/// text and a closing fence at the end. Text without fences is returned
/// unchanged, and a fence in the middle of the text is left alone.
pub fn strip_code_fences(text: &str) -> String {
    let opened = text.trim_start();
    let body = if opened.starts_with("```") {
        match opened.find('\n') {
            Some(idx) => &opened[idx + 1..],
            None => "",
        }
    } else {
        text
    };

    let trimmed = body.trim_end();
    if trimmed.ends_with("```") {
        trimmed[..trimmed.len() - 3].to_string()
    } else {
        body.to_string()
    }
}

/// A suggestion for a single file, split into its sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSuggestion {
    pub path: String,
    pub segments: Vec<String>,
}

impl FileSuggestion {
    pub fn new(path: impl Into<String>, raw: &str) -> Self {
        Self {
            path: path.into(),
            segments: split_suggestion(raw),
        }
    }

    /// Revised file content, the first section.
    pub fn revised(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    /// Reviewer summary, the second section when the model produced one.
    pub fn summary(&self) -> &str {
        self.segments.get(1).map(String::as_str).unwrap_or("")
    }
}
