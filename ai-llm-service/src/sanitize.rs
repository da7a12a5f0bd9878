//! Output sanitation for the assistant subprocess.
//!
//! The assistant writes for a terminal: ANSI colour codes, box-drawing rules,
//! start-up banners, token counters and progress bars are mixed into the
//! answer. The helpers below turn that stream into markdown suitable for a
//! merge-request note, and detect upstream model failures that are printed as
//! ordinary text.

use std::sync::OnceLock;

use regex::Regex;

fn ansi_escape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1B[@-_][0-?]*[ -/]*[@-~]").expect("valid ansi regex"))
}

fn box_drawing() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[─│╭╮╰╯┤├┬┴┼═║╔╗╚╝╠╣╦╩╪╫]+\n?").expect("valid box-drawing regex")
    })
}

/// Start-up, progress and bookkeeping lines printed by the assistant itself.
fn meta_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)^(",
            r"Aider v|Model:|Main model:|Weak model:|Git repo:|Repo-map:|",
            r"Added \S+ to the chat|Tokens:|Cost:|Applied edit to|",
            r"Only \d+ reflections|Summarization failed|can't summarize|",
            r"Auto-committing|Warning:|No changes made|",
            r"[A-Za-z0-9_./-]+\.[A-Za-z]{1,5}\s*$",
            r")"
        ))
        .expect("valid meta-line regex")
    })
}

/// Progress bar of the form `[████░░░░] 42%`.
fn progress_bar() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[\s█░▓▒]+\]\s*\d+%").expect("valid progress regex"))
}

/// Known texts printed when the model backend is unreachable or failing.
fn upstream_failure() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(Connection error|InternalServerError|litellm\.|API provider.*down|Retrying in \d)",
        )
        .expect("valid upstream-failure regex")
    })
}

const BULLET_GLYPHS: [char; 4] = ['•', '●', '▪', '◦'];

/// Removes ANSI escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ansi_escape().replace_all(text, "").into_owned()
}

/// Removes runs of box-drawing characters (the assistant's separator rules).
pub fn strip_box_drawing(text: &str) -> String {
    box_drawing().replace_all(text, "").into_owned()
}

/// Drops the assistant's own meta lines and progress bars, then collapses
/// runs of blank lines to a single blank line.
pub fn strip_meta_lines(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !meta_line().is_match(line) && !progress_bar().is_match(line))
        .collect();
    collapse_blank_lines(&kept).trim().to_string()
}

/// Normalizes markdown for rendering in the hosting platform:
///
/// - trailing whitespace is removed from every line;
/// - unicode bullet glyphs at line start become `- `;
/// - every heading line is surrounded by blank lines;
/// - runs of blank lines collapse to one.
///
/// Lines inside fenced code blocks are left untouched.
pub fn normalize_markdown(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    let mut after_heading = false;

    for raw in text.lines() {
        let line = raw.trim_end();

        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            if after_heading {
                out.push(String::new());
                after_heading = false;
            }
            out.push(line.to_string());
            continue;
        }
        if in_fence {
            out.push(line.to_string());
            continue;
        }

        let line = normalize_bullet(line);
        let blank = line.trim().is_empty();
        let heading = is_heading(&line);

        if after_heading && !blank {
            out.push(String::new());
        }
        if heading && out.last().is_some_and(|prev| !prev.trim().is_empty()) {
            out.push(String::new());
        }

        after_heading = heading;
        out.push(line);
    }

    collapse_blank_lines(&out).trim().to_string()
}

/// Returns the first upstream-failure signature found in `text`, if any.
pub fn find_upstream_failure(text: &str) -> Option<String> {
    upstream_failure()
        .find(text)
        .map(|m| m.as_str().to_string())
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

fn normalize_bullet(line: &str) -> String {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(indent_len);
    match rest.chars().next() {
        Some(c) if BULLET_GLYPHS.contains(&c) => {
            let body = rest[c.len_utf8()..].trim_start();
            format!("{indent}- {body}")
        }
        _ => line.to_string(),
    }
}

fn collapse_blank_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut prev_blank = false;
    for line in lines {
        let line = line.as_ref();
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        out.push(if blank { "" } else { line });
        prev_blank = blank;
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_ansi_sequences() {
        let s = "\x1b[1;32mReview\x1b[0m done\x1b[K";
        assert_eq!(strip_ansi(s), "Review done");
    }

    #[test]
    fn removes_box_drawing_rules() {
        let s = "────────────\nanswer\n╭──╮\n";
        assert_eq!(strip_box_drawing(s), "answer\n");
    }

    #[test]
    fn meta_lines_and_progress_bars_are_dropped() {
        let s = "Aider v0.86.1\n\
                 Model: openai/qwen with diff edit format\n\
                 Git repo: .git with 120 files\n\
                 Repo-map: using 1024 tokens\n\
                 Added server.cpp to the chat.\n\
                 server.cpp\n\
                 [█████░░░░░] 50%\n\
                 \n\n\n\
                 The change looks correct.\n\
                 Tokens: 3.1k sent, 250 received.\n";
        assert_eq!(strip_meta_lines(s), "The change looks correct.");
    }

    #[test]
    fn ordinary_sentences_survive_meta_filter() {
        let s = "Added validation is missing in parse().\nSee main.rs for details.";
        assert_eq!(strip_meta_lines(s), s);
    }

    #[test]
    fn bullets_and_headings_are_normalized() {
        let s = "Intro\n## Summary\n• first\n  ● nested\ntext   \n\n\n\n### Next\nend";
        let expected = "Intro\n\n## Summary\n\n- first\n  - nested\ntext\n\n### Next\n\nend";
        assert_eq!(normalize_markdown(s), expected);
    }

    #[test]
    fn code_fences_are_left_alone() {
        let s = "```sh\n# not a heading\n• keep\n```";
        assert_eq!(normalize_markdown(s), s);
    }

    #[test]
    fn detects_upstream_failure_signatures() {
        assert_eq!(
            find_upstream_failure("openai.APIConnectionError: Connection error."),
            Some("Connection error".to_string())
        );
        assert!(find_upstream_failure("litellm.InternalServerError: 502").is_some());
        assert!(find_upstream_failure("Retrying in 2.0 seconds...").is_some());
        assert!(find_upstream_failure("The API provider is down").is_some());
        assert!(find_upstream_failure("All good, LGTM").is_none());
    }
}
