//! Branch-to-branch diff extraction and bounding.

pub mod chunk;

use std::path::Path;

use project_code_store::WorkspaceCache;
use tracing::{error, info};

pub use chunk::{chunk_diff, preamble_chars};

/// Diff text plus the bookkeeping needed for truncation warnings.
///
/// Lengths are counted in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub content: String,
    /// `content` was cut from a longer diff.
    pub truncated: bool,
    /// Length of the untruncated diff.
    pub original_length: usize,
}

impl DiffResult {
    pub fn new(content: String) -> Self {
        let original_length = content.chars().count();
        Self {
            content,
            truncated: false,
            original_length,
        }
    }

    /// A fragment of a diff whose full length was `original_length`.
    pub fn fragment(content: String, original_length: usize) -> Self {
        let truncated = content.chars().count() < original_length;
        Self {
            content,
            truncated,
            original_length,
        }
    }

    /// Caps `content` at `max_chars` characters.
    pub fn capped(self, max_chars: usize) -> Self {
        let cut = chunk::truncate_chars(&self.content, max_chars);
        if cut.len() == self.content.len() {
            return self;
        }
        Self {
            content: cut.to_string(),
            truncated: true,
            original_length: self.original_length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn len_chars(&self) -> usize {
        self.content.chars().count()
    }
}

/// Fetches `target_branch` and returns `origin/target...origin/source`.
///
/// A failed fetch yields `None`; the diff command's own exit status is not
/// checked, its captured stdout is used as-is.
pub async fn extract_diff(
    workspaces: &WorkspaceCache,
    workspace: &Path,
    source_branch: &str,
    target_branch: &str,
) -> Option<DiffResult> {
    info!(source = source_branch, target = target_branch, "extracting diff");

    if let Err(e) = workspaces.fetch(workspace, target_branch).await {
        error!(target = target_branch, error = %e, "fetching target branch failed");
        return None;
    }

    match workspaces
        .diff(workspace, target_branch, source_branch)
        .await
    {
        Ok(content) => {
            let diff = DiffResult::new(content);
            info!(chars = diff.original_length, "diff extracted");
            Some(diff)
        }
        Err(e) => {
            error!(error = %e, "running git diff failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capping_records_original_length() {
        let d = DiffResult::new("é".repeat(30)).capped(10);
        assert!(d.truncated);
        assert_eq!(d.len_chars(), 10);
        assert_eq!(d.original_length, 30);
    }

    #[test]
    fn capping_short_diff_is_a_no_op() {
        let d = DiffResult::new("diff --git a/x b/x\n".into());
        assert_eq!(d.clone().capped(1000), d);
    }

    #[test]
    fn fragment_flags_truncation() {
        assert!(DiffResult::fragment("abc".into(), 10).truncated);
        assert!(!DiffResult::fragment("abc".into(), 3).truncated);
    }
}
