//! Overview generation with map-reduce for large diffs.
//!
//! A diff that fits one chunk gets the single-pass overview prompt. Larger
//! diffs are analyzed chunk by chunk (map, sequential, failures skipped) and
//! the partial analyses are merged into one report (reduce).
//!
//! The assistant is passed in as a closure so the protocol does not depend
//! on a concrete runner.

use std::future::Future;

use tracing::{info, warn};

use crate::diff::{DiffResult, chunk_diff, preamble_chars};
use crate::errors::{TaskError, TaskResult};
use crate::review::prompt::{aggregate_prompt, chunk_analysis_prompt, overview_prompt};

/// Raw overview report for `diff`, ready for parsing.
pub async fn generate_overview<F, Fut>(
    diff: &DiffResult,
    max_chars: usize,
    original_title: &str,
    mut invoke: F,
) -> TaskResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Option<String>>,
{
    let chunks = chunk_diff(&diff.content, max_chars);
    if chunks.len() <= 1 {
        // Text ahead of the first file is not diff content; dropping it is
        // not truncation.
        let body_length = diff
            .original_length
            .saturating_sub(preamble_chars(&diff.content));
        let single = DiffResult::fragment(
            chunks.into_iter().next().unwrap_or_default(),
            body_length,
        );
        info!(chars = single.len_chars(), truncated = single.truncated, "single-pass overview");
        return invoke(overview_prompt(&single, original_title))
            .await
            .ok_or(TaskError::Assistant);
    }
    summarize_chunks(&chunks, original_title, invoke).await
}

/// Map-reduce over `chunks`.
///
/// # Errors
/// - [`TaskError::NoPartialAnalyses`] when every chunk failed
/// - [`TaskError::Assistant`] when the aggregation call failed
pub async fn summarize_chunks<F, Fut>(
    chunks: &[String],
    original_title: &str,
    mut invoke: F,
) -> TaskResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Option<String>>,
{
    let total = chunks.len();
    let mut partials: Vec<(usize, String)> = Vec::with_capacity(total);

    for (i, chunk) in chunks.iter().enumerate() {
        let index = i + 1;
        info!(chunk = index, total, chars = chunk.chars().count(), "map: analyzing chunk");
        match invoke(chunk_analysis_prompt(index, total, chunk)).await {
            Some(text) => partials.push((index, text)),
            None => warn!(chunk = index, total, "map: chunk analysis failed, skipping"),
        }
    }

    if partials.is_empty() {
        return Err(TaskError::NoPartialAnalyses { chunks: total });
    }

    info!(succeeded = partials.len(), total, "reduce: aggregating partial analyses");
    invoke(aggregate_prompt(original_title, &partials, total))
        .await
        .ok_or(TaskError::Assistant)
}
