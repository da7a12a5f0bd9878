//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a top-level error type [`AiLlmError`] for configuration
//! problems, the [`AssistantFailure`] taxonomy for a single assistant call, and
//! small helpers for reading/validating environment variables.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
///
/// Messages name the offending variable, never its value.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (timeouts, limits).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `AIDER_TIMEOUT`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u64 > 0`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `REMOTE_LLM_BASE_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Assistant failures                                                        */
/* ------------------------------------------------------------------------- */

/// Why a single assistant invocation did not produce a usable answer.
///
/// Every variant is a normal outcome of the call, never a panic: callers log
/// it and stop the task.
#[derive(Debug, Error)]
pub enum AssistantFailure {
    /// The subprocess did not finish within the configured timeout.
    #[error("[AI LLM Service] assistant timed out after {0:?}")]
    Timeout(Duration),

    /// The subprocess exited with a non-zero status.
    #[error("[AI LLM Service] assistant exited with code {code:?}: {stderr}")]
    NonZeroExit {
        /// Exit code; `None` when terminated by a signal.
        code: Option<i32>,
        /// ANSI-stripped stderr.
        stderr: String,
    },

    /// The output carries an upstream failure signature even though the
    /// subprocess may have exited with code 0.
    #[error("[AI LLM Service] upstream model failure detected: {signature}")]
    UpstreamError {
        /// The matched signature text.
        signature: String,
    },

    /// The sanitized output was empty.
    #[error("[AI LLM Service] assistant produced no output")]
    EmptyOutput,

    /// The subprocess could not be spawned or awaited.
    #[error("[AI LLM Service] failed to run assistant: {0}")]
    Spawn(#[from] std::io::Error),
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`AiLlmError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Reads an optional variable, falling back to `default` when unset or empty.
pub fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Parses an optional variable (`Ok(default)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but does not
/// parse as `T`.
pub fn env_parse<T: FromStr>(name: &'static str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<T>().map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "could not parse value",
            })
        }),
        _ => Ok(default),
    }
}

/// Parses a positive `u64` (`default` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] when the value is not a `u64 > 0`.
pub fn env_positive_u64(name: &'static str, default: u64) -> Result<u64> {
    let value = env_parse::<u64>(name, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidNumber {
            var: name,
            reason: "expected u64 > 0",
        }
        .into());
    }
    Ok(value)
}

/// Reads a boolean flag; `1`, `true`, `yes`, `on` enable it.
pub fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            matches!(
                v.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`AiLlmError::Config`] with [`ConfigError::InvalidFormat`] when
/// the string does not start with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}
