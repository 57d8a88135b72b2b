//! OpenAI-compatible client configuration with sensible defaults.
//!
//! Groq, Gemini, the Hugging Face router and OpenAI itself all speak the same
//! chat-completions protocol, so one client type serves every provider.

use crate::config::ApiCredentials;
use crate::error::{Result, SvarError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for model API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for the given endpoint with the default timeout.
pub fn create_client(credentials: &ApiCredentials) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(credentials, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client for the given endpoint with a custom timeout.
pub fn create_client_with_timeout(
    credentials: &ApiCredentials,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SvarError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_key(credentials.api_key.clone())
        .with_api_base(credentials.api_base.trim_end_matches('/').to_string());

    Ok(Client::with_config(config).with_http_client(http_client))
}
