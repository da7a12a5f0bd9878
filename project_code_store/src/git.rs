//! Thin async wrapper over the `git` executable.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::errors::{Result, SyncError};
use crate::remote::RemoteUrl;

/// Captured result of a finished git process; output already redacted.
#[derive(Debug)]
pub(crate) struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// One git invocation.
///
/// `label` is what appears in logs and errors; `args` may contain the secret
/// URL and is never logged.
pub(crate) struct GitCommand<'a> {
    pub cwd: &'a Path,
    pub args: Vec<&'a str>,
    pub label: String,
}

/// Runs git and returns its output whatever the exit status.
pub(crate) async fn run_unchecked(
    cmd: &GitCommand<'_>,
    remote: &RemoteUrl,
    limit: Duration,
) -> Result<GitOutput> {
    debug!(command = %cmd.label, cwd = %cmd.cwd.display(), "git");

    let mut child = Command::new("git");
    child
        .args(&cmd.args)
        .current_dir(cmd.cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(limit, child.output()).await {
        Ok(res) => res?,
        Err(_) => {
            return Err(SyncError::Timeout {
                command: cmd.label.clone(),
                secs: limit.as_secs(),
            });
        }
    };

    Ok(GitOutput {
        stdout: remote.redact(&String::from_utf8_lossy(&output.stdout)),
        stderr: remote.redact(String::from_utf8_lossy(&output.stderr).trim()),
        exit_code: output.status.code(),
    })
}

/// Runs git and maps a non-zero exit to [`SyncError::Command`].
pub(crate) async fn run_checked(
    cmd: &GitCommand<'_>,
    remote: &RemoteUrl,
    limit: Duration,
) -> Result<GitOutput> {
    let out = run_unchecked(cmd, remote, limit).await?;
    if out.success() {
        Ok(out)
    } else {
        Err(SyncError::Command {
            command: cmd.label.clone(),
            exit_code: out.exit_code,
            stderr: out.stderr,
        })
    }
}

/// Rejects ref names that git would read as options.
pub(crate) fn check_branch(branch: &str) -> Result<()> {
    if branch.is_empty() || branch.starts_with('-') || branch.chars().any(char::is_control) {
        return Err(SyncError::InvalidBranch(branch.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_like_branches_are_rejected() {
        assert!(check_branch("feature/login").is_ok());
        assert!(check_branch("--upload-pack=sh").is_err());
        assert!(check_branch("").is_err());
        assert!(check_branch("a\nb").is_err());
    }
}
