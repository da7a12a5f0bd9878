//! Overview report parser.
//!
//! Expected shape (a convention the assistant is asked to follow):
//!
//! ```text
//! TITLE: <summary>
//! ---
//! <markdown body>
//! ```
//!
//! Parsing never fails. Without a usable `TITLE:` line the result has an
//! empty title and the raw text as description.

use tracing::warn;

const TITLE_MARKER: &str = "TITLE:";
const SEPARATOR: &str = "---";
/// Lines after the title searched for the separator.
const SEPARATOR_LOOKAHEAD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewResult {
    /// Empty when parsing fell back.
    pub title: String,
    pub description: String,
}

impl OverviewResult {
    /// `true` when no title was found; callers keep the existing MR title.
    pub fn is_fallback(&self) -> bool {
        self.title.is_empty()
    }
}

pub fn parse_overview(raw: &str) -> OverviewResult {
    let lines: Vec<&str> = raw.trim().lines().collect();

    let found = lines.iter().enumerate().find_map(|(i, line)| {
        line.trim()
            .strip_prefix(TITLE_MARKER)
            .map(|rest| (i, rest.trim()))
    });

    let (title_idx, title) = match found {
        Some((i, title)) if !title.is_empty() => (i, title),
        _ => {
            warn!("overview output has no TITLE line, using fallback");
            return OverviewResult {
                title: String::new(),
                description: raw.to_string(),
            };
        }
    };

    let window_end = (title_idx + 1 + SEPARATOR_LOOKAHEAD).min(lines.len());
    let desc_start = (title_idx + 1..window_end)
        .find(|&i| lines[i].trim() == SEPARATOR)
        .map(|i| i + 1)
        .unwrap_or(title_idx + 1);

    OverviewResult {
        title: title.to_string(),
        description: lines[desc_start..].join("\n").trim().to_string(),
    }
}
