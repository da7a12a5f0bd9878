use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Failure of a workspace or git operation.
///
/// Every string carried here has already passed through
/// [`crate::RemoteUrl::redact`]; the credential-bearing URL never appears.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("`{command}` failed with exit code {exit_code:?}: {stderr}")]
    Command {
        /// Redacted command label, e.g. `git fetch origin feat`.
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("refusing to use branch name {0:?}")]
    InvalidBranch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
