use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::Result;
use crate::git::{GitCommand, check_branch, run_checked, run_unchecked};
use crate::remote::RemoteUrl;

const REMOTE_NAME: &str = "origin";

/// Directory cache with one git checkout per merge request.
///
/// Layout: `<base>/<project>_mr_<mr_id>`. A workspace is either absent or a
/// checkout of the MR's source branch.
#[derive(Debug, Clone)]
pub struct WorkspaceCache {
    base: PathBuf,
    project_name: String,
    remote: RemoteUrl,
    git_timeout: Duration,
}

impl WorkspaceCache {
    /// `project_path` is `group/sub/project`; only its last segment is used
    /// for directory names.
    pub fn new(
        base: impl Into<PathBuf>,
        project_path: &str,
        remote: RemoteUrl,
        git_timeout: Duration,
    ) -> Self {
        let last = project_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let project_name = if last.is_empty() {
            "project".to_string()
        } else {
            sanitize_component(last)
        };
        Self {
            base: base.into(),
            project_name,
            remote,
            git_timeout,
        }
    }

    /// Deterministic workspace path for an MR. No I/O.
    pub fn path_for(&self, mr_id: &str) -> PathBuf {
        self.base
            .join(format!("{}_mr_{}", self.project_name, sanitize_component(mr_id)))
    }

    /// Creates the base directory if missing.
    pub async fn ensure_base(&self) -> Result<()> {
        fs::create_dir_all(&self.base).await?;
        info!(path = %self.base.display(), "workspace base ready");
        Ok(())
    }

    /// Clones or refreshes the MR workspace so it holds `source_branch`.
    ///
    /// Existing checkout: `fetch`, `checkout`, `pull --ff-only`; the first
    /// failing command aborts. Otherwise the directory is recreated and
    /// the branch cloned into it.
    #[instrument(skip(self), fields(path = %self.path_for(mr_id).display()))]
    pub async fn sync(&self, mr_id: &str, source_branch: &str) -> Result<PathBuf> {
        check_branch(source_branch)?;
        let path = self.path_for(mr_id);

        if fs::try_exists(path.join(".git")).await.unwrap_or(false) {
            info!(branch = source_branch, "existing workspace, refreshing");
            self.git(&path, vec!["fetch", REMOTE_NAME, source_branch])
                .await?;
            self.git(&path, vec!["checkout", source_branch]).await?;
            self.git(&path, vec!["pull", "--ff-only", REMOTE_NAME, source_branch])
                .await?;
        } else {
            if fs::try_exists(&path).await.unwrap_or(false) {
                warn!("directory without checkout, recreating");
                fs::remove_dir_all(&path).await?;
            }
            fs::create_dir_all(&path).await?;

            info!(branch = source_branch, "new workspace, cloning");
            let cmd = GitCommand {
                cwd: &path,
                args: vec!["clone", "--branch", source_branch, self.remote.expose(), "."],
                label: format!("git clone --branch {source_branch}"),
            };
            run_checked(&cmd, &self.remote, self.git_timeout).await?;
        }

        info!(branch = source_branch, "workspace synced");
        Ok(path)
    }

    /// `git fetch origin <branch>` inside `path`.
    pub async fn fetch(&self, path: &Path, branch: &str) -> Result<()> {
        check_branch(branch)?;
        self.git(path, vec!["fetch", REMOTE_NAME, branch]).await
    }

    /// Three-dot diff `origin/<target>...origin/<source>`.
    ///
    /// The exit status is ignored: stdout is returned as-is, so an empty or
    /// partial diff is not an error. Only spawn failures and timeouts are.
    pub async fn diff(&self, path: &Path, target: &str, source: &str) -> Result<String> {
        check_branch(target)?;
        check_branch(source)?;
        let range = format!("{REMOTE_NAME}/{target}...{REMOTE_NAME}/{source}");
        let cmd = GitCommand {
            cwd: path,
            args: vec!["diff", range.as_str()],
            label: format!("git diff {range}"),
        };
        let out = run_unchecked(&cmd, &self.remote, self.git_timeout).await?;
        if !out.success() {
            warn!(exit = ?out.exit_code, stderr = %out.stderr, "git diff exited non-zero, using captured output");
        }
        Ok(out.stdout)
    }

    /// Removes the MR workspace. Never fails; errors are logged.
    #[instrument(skip(self))]
    pub async fn cleanup(&self, mr_id: &str) {
        let path = self.path_for(mr_id);
        match fs::remove_dir_all(&path).await {
            Ok(()) => info!(path = %path.display(), "workspace removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no workspace to remove")
            }
            Err(e) => error!(path = %path.display(), error = %e, "workspace removal failed"),
        }
    }

    async fn git(&self, cwd: &Path, args: Vec<&str>) -> Result<()> {
        let cmd = GitCommand {
            cwd,
            label: format!("git {}", args.join(" ")),
            args,
        };
        run_checked(&cmd, &self.remote, self.git_timeout).await?;
        Ok(())
    }
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SyncError;

    fn cache(base: &Path, remote: RemoteUrl) -> WorkspaceCache {
        WorkspaceCache::new(base, "group/sub/for_ai_review_test", remote, Duration::from_secs(30))
    }

    #[test]
    fn path_is_derived_from_project_and_mr() {
        let c = cache(Path::new("/tmp/ws"), RemoteUrl::new("x", None));
        assert_eq!(
            c.path_for("42"),
            PathBuf::from("/tmp/ws/for_ai_review_test_mr_42")
        );
        assert_eq!(c.path_for("42"), c.path_for("42"));
        assert_eq!(
            c.path_for("../etc"),
            PathBuf::from("/tmp/ws/for_ai_review_test_mr____etc")
        );
    }

    #[test]
    fn project_name_falls_back_when_path_is_empty() {
        let c = WorkspaceCache::new("/b", "", RemoteUrl::new("x", None), Duration::from_secs(1));
        assert_eq!(c.path_for("1"), PathBuf::from("/b/project_mr_1"));
    }

    #[tokio::test]
    async fn ensure_base_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let c = cache(&tmp.path().join("a/b"), RemoteUrl::new("x", None));
        c.ensure_base().await.unwrap();
        c.ensure_base().await.unwrap();
        assert!(tmp.path().join("a/b").is_dir());
    }

    #[tokio::test]
    async fn cleanup_missing_workspace_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let c = cache(tmp.path(), RemoteUrl::new("x", None));
        c.cleanup("404").await;
        c.cleanup("404").await;
    }

    #[tokio::test]
    async fn cleanup_removes_existing_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        let c = cache(tmp.path(), RemoteUrl::new("x", None));
        let ws = c.path_for("5");
        std::fs::create_dir_all(ws.join("src")).unwrap();
        std::fs::write(ws.join("src/main.rs"), "fn main() {}").unwrap();
        c.cleanup("5").await;
        assert!(!ws.exists());
    }

    mod with_git {
        use super::*;
        use std::process::Command as StdCommand;

        fn git_available() -> bool {
            StdCommand::new("git")
                .arg("--version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        }

        fn git(cwd: &Path, args: &[&str]) {
            let status = StdCommand::new("git")
                .args(["-c", "user.name=bot", "-c", "user.email=bot@test", "-c", "commit.gpgsign=false"])
                .args(args)
                .current_dir(cwd)
                .output()
                .unwrap();
            assert!(status.status.success(), "git {args:?}: {status:?}");
        }

        /// Origin repo with `main` (a.txt) and `feat` (adds b.txt).
        fn origin_repo(root: &Path) -> PathBuf {
            let origin = root.join("origin");
            std::fs::create_dir_all(&origin).unwrap();
            git(&origin, &["init", "-q"]);
            std::fs::write(origin.join("a.txt"), "alpha\n").unwrap();
            git(&origin, &["add", "."]);
            git(&origin, &["commit", "-q", "-m", "init"]);
            git(&origin, &["branch", "-M", "main"]);
            git(&origin, &["checkout", "-q", "-b", "feat"]);
            std::fs::write(origin.join("b.txt"), "beta\n").unwrap();
            git(&origin, &["add", "."]);
            git(&origin, &["commit", "-q", "-m", "feat"]);
            git(&origin, &["checkout", "-q", "main"]);
            origin
        }

        #[tokio::test]
        async fn clone_refresh_and_diff() {
            if !git_available() {
                return;
            }
            let tmp = tempfile::tempdir().unwrap();
            let origin = origin_repo(tmp.path());
            let c = cache(
                &tmp.path().join("ws"),
                RemoteUrl::new(origin.display().to_string(), None),
            );
            c.ensure_base().await.unwrap();

            let ws = c.sync("7", "feat").await.unwrap();
            assert!(ws.join(".git").exists());
            assert!(ws.join("b.txt").exists());

            // second sync takes the refresh path
            let again = c.sync("7", "feat").await.unwrap();
            assert_eq!(ws, again);

            c.fetch(&ws, "main").await.unwrap();
            let diff = c.diff(&ws, "main", "feat").await.unwrap();
            assert!(diff.contains("diff --git a/b.txt b/b.txt"));
            assert!(!diff.contains("a.txt"));
        }

        #[tokio::test]
        async fn stale_non_checkout_directory_is_replaced() {
            if !git_available() {
                return;
            }
            let tmp = tempfile::tempdir().unwrap();
            let origin = origin_repo(tmp.path());
            let c = cache(
                &tmp.path().join("ws"),
                RemoteUrl::new(origin.display().to_string(), None),
            );
            let ws = c.path_for("8");
            std::fs::create_dir_all(&ws).unwrap();
            std::fs::write(ws.join("junk"), "x").unwrap();

            c.sync("8", "feat").await.unwrap();
            assert!(!ws.join("junk").exists());
            assert!(ws.join(".git").exists());
        }

        #[tokio::test]
        async fn clone_failure_is_redacted() {
            if !git_available() {
                return;
            }
            let tmp = tempfile::tempdir().unwrap();
            let missing = tmp.path().join("s3cr3t-token-repo");
            let c = cache(
                &tmp.path().join("ws"),
                RemoteUrl::new(missing.display().to_string(), Some("s3cr3t-token".into())),
            );

            let err = c.sync("9", "feat").await.unwrap_err();
            match &err {
                SyncError::Command { command, .. } => {
                    assert_eq!(command, "git clone --branch feat");
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert!(!err.to_string().contains("s3cr3t-token"));
        }

        #[tokio::test]
        async fn diff_of_unknown_branch_is_empty_not_error() {
            if !git_available() {
                return;
            }
            let tmp = tempfile::tempdir().unwrap();
            let origin = origin_repo(tmp.path());
            let c = cache(
                &tmp.path().join("ws"),
                RemoteUrl::new(origin.display().to_string(), None),
            );
            let ws = c.sync("3", "feat").await.unwrap();
            let diff = c.diff(&ws, "does-not-exist", "feat").await.unwrap();
            assert!(diff.is_empty());
            assert!(c.fetch(&ws, "does-not-exist").await.is_err());
        }
    }
}
