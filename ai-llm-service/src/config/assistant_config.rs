use std::fmt;
use std::time::Duration;

/// Environment variable read by the assistant for the model endpoint.
pub const ENV_API_BASE: &str = "OPENAI_API_BASE";
/// Environment variable read by the assistant for the model credential.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Configuration for an assistant invocation.
///
/// The value is immutable and passed explicitly into every call, so concurrent
/// invocations never share mutable process state.
///
/// # Fields
///
/// - `program`: executable name or path (normally `aider`).
/// - `model`: model identifier passed via `--model`.
/// - `endpoint`: remote language-model endpoint.
/// - `api_key`: credential for `endpoint`; redacted in `Debug`.
/// - `timeout`: wall-clock limit for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    /// Executable name or absolute path.
    pub program: String,

    /// Model identifier (e.g., `"openai/Qwen/Qwen3-Coder-30B-A3B-Instruct"`).
    pub model: String,

    /// Remote language-model endpoint (http/https URL).
    pub endpoint: String,

    /// Credential for the endpoint.
    pub api_key: String,

    /// Maximum run time of a single invocation.
    pub timeout: Duration,
}

impl AssistantConfig {
    /// Environment overrides applied to the child process only.
    pub fn env_overrides(&self) -> Vec<(String, String)> {
        vec![
            (ENV_API_BASE.to_string(), self.endpoint.clone()),
            (ENV_API_KEY.to_string(), self.api_key.clone()),
        ]
    }
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("program", &self.program)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_api_key() {
        let cfg = AssistantConfig {
            program: "aider".into(),
            model: "m".into(),
            endpoint: "http://llm:8000/v1".into(),
            api_key: "sk-very-secret".into(),
            timeout: Duration::from_secs(5),
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("http://llm:8000/v1"));
    }

    #[test]
    fn env_overrides_point_at_endpoint_and_key() {
        let cfg = AssistantConfig {
            program: "aider".into(),
            model: "m".into(),
            endpoint: "http://llm:8000/v1".into(),
            api_key: "k".into(),
            timeout: Duration::from_secs(5),
        };
        let env = cfg.env_overrides();
        assert!(env.contains(&(ENV_API_BASE.to_string(), "http://llm:8000/v1".to_string())));
        assert!(env.contains(&(ENV_API_KEY.to_string(), "k".to_string())));
    }
}
