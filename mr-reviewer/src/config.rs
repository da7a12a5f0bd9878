//! Bot settings loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Required: `GITLAB_TOKEN`, `GITLAB_HOST`, `PROJECT_PATH`, `REMOTE_LLM_BASE_URL`.
//!
//! Optional (defaults in parentheses): `WORKSPACE_BASE` (`/tmp/aider_workspaces`),
//! `DIFF_MAX_CHARS` (10000), `GIT_TIMEOUT` (60), `HTTP_TIMEOUT` (10),
//! `MENTION_TOKEN` (`@aider`), `AUTO_REVIEW_ON_UPDATE` (false),
//! `MAX_CONCURRENT_TASKS` (4), plus the assistant variables read by
//! [`ai_llm_service::config::default_config::config_aider_from_env`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use ai_llm_service::config::default_config::config_aider_from_env;
use ai_llm_service::error_handler::{
    Result, env_bool, env_or, env_positive_u64, must_env,
};
use ai_llm_service::AssistantConfig;
use project_code_store::RemoteUrl;

pub const DEFAULT_WORKSPACE_BASE: &str = "/tmp/aider_workspaces";
pub const DEFAULT_DIFF_MAX_CHARS: u64 = 10_000;
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MENTION_TOKEN: &str = "@aider";
pub const DEFAULT_MAX_CONCURRENT_TASKS: u64 = 4;

/// GitLab connection details.
#[derive(Clone)]
pub struct GitLabSettings {
    /// Host without scheme, e.g. `gitlab.example.com`.
    pub host: String,
    /// `true` when `GITLAB_HOST` was given with an `https://` prefix.
    pub https: bool,
    pub token: String,
    /// `group/sub/project`.
    pub project_path: String,
}

impl GitLabSettings {
    /// Splits an optional scheme off `raw`; anything but `https://` means http.
    pub fn new(raw_host: &str, token: String, project_path: String) -> Self {
        let raw_host = raw_host.trim();
        let (https, host) = match raw_host.strip_prefix("https://") {
            Some(rest) => (true, rest),
            None => (false, raw_host.strip_prefix("http://").unwrap_or(raw_host)),
        };
        Self {
            host: host.trim_end_matches('/').to_string(),
            https,
            token,
            project_path: project_path.trim_matches('/').to_string(),
        }
    }

    /// REST base, e.g. `http://gitlab.local/api/v4`.
    pub fn api_base(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{scheme}://{}/api/v4", self.host)
    }

    /// Credential-bearing clone URL.
    pub fn remote_url(&self) -> RemoteUrl {
        RemoteUrl::gitlab(self.https, &self.host, &self.project_path, &self.token)
    }
}

impl fmt::Debug for GitLabSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabSettings")
            .field("host", &self.host)
            .field("https", &self.https)
            .field("token", &"***")
            .field("project_path", &self.project_path)
            .finish()
    }
}

/// Webhook classification knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Mention token, matched case-insensitively.
    pub mention_token: String,
    /// Route MR `update` actions to a review task.
    pub auto_review_on_update: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mention_token: DEFAULT_MENTION_TOKEN.to_string(),
            auto_review_on_update: false,
        }
    }
}

/// Everything the bot needs, validated once at startup.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub gitlab: GitLabSettings,
    pub assistant: AssistantConfig,
    pub workspace_base: PathBuf,
    /// Per-chunk and per-diff character limit.
    pub diff_max_chars: usize,
    pub git_timeout: Duration,
    pub http_timeout: Duration,
    pub router: RouterConfig,
    pub max_concurrent_tasks: usize,
}

impl BotSettings {
    /// # Errors
    /// [`ai_llm_service::ConfigError`] naming the first missing or invalid variable.
    pub fn from_env() -> Result<Self> {
        let gitlab = GitLabSettings::new(
            &must_env("GITLAB_HOST")?,
            must_env("GITLAB_TOKEN")?,
            must_env("PROJECT_PATH")?,
        );
        let assistant = config_aider_from_env()?;

        Ok(Self {
            gitlab,
            assistant,
            workspace_base: PathBuf::from(env_or("WORKSPACE_BASE", DEFAULT_WORKSPACE_BASE)),
            diff_max_chars: env_positive_u64("DIFF_MAX_CHARS", DEFAULT_DIFF_MAX_CHARS)? as usize,
            git_timeout: Duration::from_secs(env_positive_u64(
                "GIT_TIMEOUT",
                DEFAULT_GIT_TIMEOUT_SECS,
            )?),
            http_timeout: Duration::from_secs(env_positive_u64(
                "HTTP_TIMEOUT",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            router: RouterConfig {
                mention_token: env_or("MENTION_TOKEN", DEFAULT_MENTION_TOKEN),
                auto_review_on_update: env_bool("AUTO_REVIEW_ON_UPDATE", false),
            },
            max_concurrent_tasks: env_positive_u64(
                "MAX_CONCURRENT_TASKS",
                DEFAULT_MAX_CONCURRENT_TASKS,
            )? as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_scheme_selection() {
        let g = GitLabSettings::new("https://gitlab.example.com/", "t".into(), "g/p".into());
        assert!(g.https);
        assert_eq!(g.api_base(), "https://gitlab.example.com/api/v4");

        let g = GitLabSettings::new("http://10.0.0.5:8080", "t".into(), "g/p".into());
        assert!(!g.https);
        assert_eq!(g.api_base(), "http://10.0.0.5:8080/api/v4");

        let g = GitLabSettings::new("gitlab.local", "t".into(), "/g/p/".into());
        assert!(!g.https);
        assert_eq!(g.project_path, "g/p");
    }

    #[test]
    fn git_timeout_default_is_one_minute() {
        assert_eq!(Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS), Duration::from_secs(60));
    }

    #[test]
    fn secrets_are_hidden_from_debug() {
        let g = GitLabSettings::new("gitlab.local", "glpat-secret".into(), "g/p".into());
        assert!(!format!("{g:?}").contains("glpat-secret"));
        assert!(!format!("{:?}", g.remote_url()).contains("glpat-secret"));
    }
}
