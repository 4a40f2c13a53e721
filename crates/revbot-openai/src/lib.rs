//! Revbot OpenAI - chat completions integration
//!
//! Client for requesting review completions from the OpenAI API or any
//! wire-compatible endpoint.

pub mod client;

pub use client::{OpenAiClient, OpenAiClientConfig};
