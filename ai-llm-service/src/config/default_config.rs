//! Default assistant config loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! - `REMOTE_LLM_BASE_URL` = model endpoint (mandatory, http/https)
//! - `REMOTE_LLM_API_KEY`  = model credential (default `dummy`)
//! - `AIDER_MODEL`         = model identifier
//! - `AIDER_BIN`           = assistant executable (default `aider`)
//! - `AIDER_TIMEOUT`       = timeout in seconds (default 600)

use std::time::Duration;

use crate::{
    config::assistant_config::AssistantConfig,
    error_handler::{
        AiLlmError, env_or, env_positive_u64, must_env, validate_http_endpoint,
    },
};

/// Default model used when `AIDER_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "openai/Qwen/Qwen3-Coder-30B-A3B-Instruct";

/// Default assistant timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Constructs the assistant config from environment.
///
/// # Errors
///
/// - [`crate::ConfigError::MissingVar`] if `REMOTE_LLM_BASE_URL` is missing
/// - [`crate::ConfigError::InvalidFormat`] if the endpoint is not http(s)
/// - [`crate::ConfigError::InvalidNumber`] if `AIDER_TIMEOUT` is not a positive integer
pub fn config_aider_from_env() -> Result<AssistantConfig, AiLlmError> {
    let endpoint = must_env("REMOTE_LLM_BASE_URL")?;
    validate_http_endpoint("REMOTE_LLM_BASE_URL", &endpoint)?;

    let timeout_secs = env_positive_u64("AIDER_TIMEOUT", DEFAULT_TIMEOUT_SECS)?;

    Ok(AssistantConfig {
        program: env_or("AIDER_BIN", "aider"),
        model: env_or("AIDER_MODEL", DEFAULT_MODEL),
        endpoint,
        api_key: env_or("REMOTE_LLM_API_KEY", "dummy"),
        timeout: Duration::from_secs(timeout_secs),
    })
}
