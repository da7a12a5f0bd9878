//! Publishing results back to the merge request.
//!
//! - GitLab: MR notes for answers and reviews, MR update for the overview.
//! - Fire-and-forget: the caller logs failures; nothing is retried.

pub mod gitlab;

pub use gitlab::{GitLabPublisher, note_body};
