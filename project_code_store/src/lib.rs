//! Per-merge-request git workspaces.
//!
//! - [`WorkspaceCache`] maps an MR id to `<base>/<project>_mr_<id>` and keeps
//!   a checkout of the MR source branch there (clone once, then fetch/pull).
//! - All git work goes through the `git` executable on Tokio's process
//!   driver, each command bounded by a timeout.
//! - [`RemoteUrl`] carries the credential-bearing clone URL; every piece of
//!   git output is redacted before it reaches a log line or an error.

pub mod errors;
mod git;
pub mod remote;
pub mod workspace;

pub use errors::{Result, SyncError};
pub use remote::RemoteUrl;
pub use workspace::WorkspaceCache;
