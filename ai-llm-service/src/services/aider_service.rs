//! Aider subprocess runner.
//!
//! One call = one `aider` process rooted at the merge-request workspace:
//!
//! - `--no-auto-commits`, `--no-gitignore`: the checkout is never mutated by git
//! - `--chat-mode ask`: read/advise only, no file edits, for every call
//! - `--yes`: interactive confirmations are auto-accepted
//! - `--exit`: terminate after one response
//! - `--message <prompt>`: the prompt is the sole instruction
//!
//! Endpoint and credential are handed to the child through its own
//! environment ([`AssistantConfig::env_overrides`]).
//!
//! Success is decided on the sanitized output, not on the exit code alone:
//! the model backend may report failures as text while the process exits 0.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

use crate::config::{answer_kind::AnswerKind, assistant_config::AssistantConfig};
use crate::error_handler::AssistantFailure;
use crate::sanitize::{
    find_upstream_failure, normalize_markdown, strip_ansi, strip_box_drawing, strip_meta_lines,
};

/// Max characters of stderr kept in a [`AssistantFailure::NonZeroExit`].
const STDERR_TAIL_CHARS: usize = 2000;

/// A fully specified assistant call. Stateless; not persisted.
#[derive(Debug, Clone)]
pub struct AssistantInvocation {
    /// Sole instruction passed via `--message`.
    pub prompt: String,
    /// Working directory of the subprocess (the MR workspace).
    pub workspace: PathBuf,
    /// Selects output sanitation.
    pub kind: AnswerKind,
    /// Wall-clock limit.
    pub timeout: Duration,
    /// Environment overrides for the child process.
    pub env: Vec<(String, String)>,
}

/// Result of one assistant call.
#[derive(Debug)]
pub enum AssistantOutcome {
    /// Sanitized, non-empty answer.
    Success(String),
    /// Timeout, non-zero exit, upstream failure signature or empty output.
    Failure(AssistantFailure),
}

/// Thin service around the assistant executable.
#[derive(Debug, Clone)]
pub struct AiderService {
    cfg: AssistantConfig,
}

impl AiderService {
    pub fn new(cfg: AssistantConfig) -> Self {
        Self { cfg }
    }

    /// Builds an invocation with the configured timeout and env overrides.
    pub fn invocation(
        &self,
        prompt: impl Into<String>,
        workspace: &Path,
        kind: AnswerKind,
    ) -> AssistantInvocation {
        AssistantInvocation {
            prompt: prompt.into(),
            workspace: workspace.to_path_buf(),
            kind,
            timeout: self.cfg.timeout,
            env: self.cfg.env_overrides(),
        }
    }

    /// Runs the assistant and returns the sanitized answer, or `None` on any
    /// failure (logged here).
    pub async fn invoke(&self, prompt: &str, workspace: &Path, kind: AnswerKind) -> Option<String> {
        let inv = self.invocation(prompt, workspace, kind);
        match self.run(&inv).await {
            AssistantOutcome::Success(text) => Some(text),
            AssistantOutcome::Failure(failure) => {
                error!(workspace = %workspace.display(), %failure, "assistant call failed");
                None
            }
        }
    }

    /// Spawns the subprocess and classifies its result.
    #[instrument(
        name = "aider_run",
        skip_all,
        fields(kind = ?inv.kind, prompt_chars = inv.prompt.chars().count())
    )]
    pub async fn run(&self, inv: &AssistantInvocation) -> AssistantOutcome {
        let mut cmd = Command::new(&self.cfg.program);
        cmd.args(build_args(&self.cfg.model, &inv.prompt))
            .current_dir(&inv.workspace)
            .envs(inv.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(model = %self.cfg.model, "running assistant");
        let started = Instant::now();

        let output = match timeout(inv.timeout, cmd.output()).await {
            Err(_) => return AssistantOutcome::Failure(AssistantFailure::Timeout(inv.timeout)),
            Ok(Err(e)) => return AssistantOutcome::Failure(AssistantFailure::Spawn(e)),
            Ok(Ok(output)) => output,
        };

        debug!(
            exit = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "assistant finished"
        );

        classify_output(
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
            inv.kind,
        )
    }
}

/// Command-line arguments for one invocation.
pub fn build_args(model: &str, prompt: &str) -> Vec<String> {
    [
        "--model",
        model,
        "--no-auto-commits",
        "--no-gitignore",
        "--no-show-model-warnings",
        "--chat-mode",
        "ask",
        "--exit",
        "--yes",
        "--message",
        prompt,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Sanitizes raw stdout according to the expected answer kind.
pub fn sanitize_stdout(raw: &str, kind: AnswerKind) -> String {
    let cleaned = strip_box_drawing(&strip_ansi(raw));
    let cleaned = if kind.is_question() {
        strip_meta_lines(&cleaned)
    } else {
        cleaned
    };
    normalize_markdown(&cleaned)
}

/// Classifies a finished subprocess.
///
/// Order matters: upstream failure signatures win over the exit code, because
/// the assistant may exit 0 after printing a connection error.
pub fn classify_output(
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
    kind: AnswerKind,
) -> AssistantOutcome {
    let stdout = sanitize_stdout(stdout, kind);
    let stderr = strip_ansi(stderr);

    if let Some(signature) =
        find_upstream_failure(&stdout).or_else(|| find_upstream_failure(&stderr))
    {
        return AssistantOutcome::Failure(AssistantFailure::UpstreamError { signature });
    }

    if exit_code != Some(0) {
        return AssistantOutcome::Failure(AssistantFailure::NonZeroExit {
            code: exit_code,
            stderr: tail_chars(stderr.trim(), STDERR_TAIL_CHARS),
        });
    }

    if stdout.trim().is_empty() {
        return AssistantOutcome::Failure(AssistantFailure::EmptyOutput);
    }

    AssistantOutcome::Success(stdout)
}

fn tail_chars(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        return s.to_string();
    }
    s.chars().skip(total - max).collect()
}
