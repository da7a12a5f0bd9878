//! Structured extraction from the assistant's free-text answers.

pub mod overview;

pub use overview::{OverviewResult, parse_overview};
