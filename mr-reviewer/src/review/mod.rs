//! Prompts and the overview map-reduce protocol.

pub mod prompt;
pub mod summarize;
