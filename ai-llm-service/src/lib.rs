//! Shared AI assistant service.
//!
//! The assistant (aider) is treated as an opaque text-in/text-out subprocess:
//!
//! - [`config`] holds the explicit, immutable invocation configuration
//!   (executable, model, endpoint, credential, timeout).
//! - [`services::aider_service`] spawns the subprocess under a timeout with
//!   per-invocation environment overrides; the process environment is never
//!   mutated.
//! - [`sanitize`] cleans terminal noise from the output and detects upstream
//!   failures that the assistant reports as plain text with exit code 0.
//! - [`telemetry`] provides the fmt layer and filter used by the binary.

pub mod config;
pub mod error_handler;
pub mod sanitize;
pub mod services;
pub mod telemetry;

pub use config::assistant_config::AssistantConfig;
pub use config::answer_kind::AnswerKind;
pub use error_handler::{AiLlmError, AssistantFailure, ConfigError};
pub use services::aider_service::{AiderService, AssistantInvocation, AssistantOutcome};
