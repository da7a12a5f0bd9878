//! Prompt builders for the assistant.
//!
//! Prompts are plain text; the diff goes into a fenced ```diff block. The
//! overview format (`TITLE:` line, `---`, markdown body) is what
//! [`crate::parser::overview::parse_overview`] expects back.

use crate::diff::DiffResult;

/// Used when a mention carries no question.
pub const DEFAULT_QUESTION: &str =
    "Give an overall code review of the changes in this merge request.";

const ROLE: &str = "You are a senior SRE and backend engineer on our team.";

const OVERVIEW_FORMAT: &str = "\
TITLE: <starts with a verb, at most 40 characters>
---
> 🤖 This description was generated by Aider AI.

## 📋 Overview
<purpose and approach of the change: why it was needed and what was changed, 3-5 sentences>

## 🔍 Key changes
<one item per changed file or component, formatted as `N. **file** - 1-2 sentences`>

## ⚠️ Review points
<potential bugs, performance or memory concerns and suggestions as bullets; \"Nothing notable\" if none>

---
*Generated by the Aider AI code review bot*";

/// Warning line for a capped diff, `None` when the diff is complete.
pub fn truncation_warning(diff: &DiffResult) -> Option<String> {
    diff.truncated.then(|| {
        format!(
            "⚠️ **Note**: the diff is too large; only the first {} characters are included (total {} characters).",
            diff.len_chars(),
            diff.original_length
        )
    })
}

/// General review of a (possibly capped) diff.
pub fn review_prompt(diff: &DiffResult, question: Option<&str>) -> String {
    let question = question
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_QUESTION);

    let mut s = String::new();
    s.push_str(ROLE);
    s.push('\n');
    s.push_str(question);
    s.push('\n');
    if let Some(w) = truncation_warning(diff) {
        s.push('\n');
        s.push_str(&w);
        s.push('\n');
    }
    s.push_str("\nThese are the code changes (diff) of this merge request:\n```diff\n");
    s.push_str(&diff.content);
    s.push_str("\n```\n\n");
    s.push_str(
        "Analyze the changes together with the repository map and answer clearly in markdown.\n\
         Never modify the code yourself.\n",
    );
    s
}

/// Free-form question about the repository, answered in ask mode.
pub fn question_prompt(question: &str) -> String {
    let question = match question.trim() {
        "" => DEFAULT_QUESTION,
        q => q,
    };
    format!(
        "[Role]\n{ROLE} Answer the question below.\n\n\
         [Question]\n{question}\n\n\
         [Answer rules]\n\
         - Do not repeat the question; start with the conclusion\n\
         - Cite real file and function names from the repository map as evidence\n\
         - Use fenced code blocks for code examples\n\
         - Simple questions: 1-2 paragraphs (under 150 words); complex analysis: use ## Conclusion / ## Details\n\
         - Mark anything you are not sure about with \"(guess)\"\n\
         - Do not edit code; only suggest changes\n"
    )
}

/// Single-pass overview report for a diff that fits one chunk.
pub fn overview_prompt(diff: &DiffResult, original_title: &str) -> String {
    let warning = truncation_warning(diff)
        .map(|w| format!("{w}\n"))
        .unwrap_or_default();
    format!(
        "[Task]\n{ROLE} Analyze the merge request diff below and write the MR description \
         strictly in the specified format.\n\
         Do not output greetings, extra explanations or repeated instructions.\n\n\
         Original MR title: {original_title}\n{warning}\n\
         [Diff]\n```diff\n{}\n```\n\n\
         [Output format - replace the < > parts with real content]\n\n{OVERVIEW_FORMAT}\n",
        diff.content
    )
}

/// Map step: per-file records for one chunk of a large diff.
pub fn chunk_analysis_prompt(index: usize, total: usize, chunk: &str) -> String {
    format!(
        "[Task]\n{ROLE} This is part {index} of {total} of a large merge request diff.\n\
         For every file touched in this part, output exactly one record in this format and nothing else:\n\n\
         FILE: <file path>\n\
         SUMMARY: <what changed, 1-2 sentences>\n\
         CONCERNS: <potential bugs, risks or suggestions; \"none\" if none>\n\n\
         [Diff part {index}/{total}]\n```diff\n{chunk}\n```\n"
    )
}

/// Reduce step: synthesize the overview report from partial analyses.
///
/// `partials` holds `(chunk index, analysis)` for successful chunks only.
pub fn aggregate_prompt(original_title: &str, partials: &[(usize, String)], total: usize) -> String {
    let mut s = format!(
        "[Task]\n{ROLE} A large merge request diff was analyzed in {total} parts.\n\
         Using only the partial analyses below, write the MR description strictly in the specified format.\n\
         Do not output greetings, extra explanations or repeated instructions.\n\n\
         Original MR title: {original_title}\n"
    );
    if partials.len() < total {
        s.push_str(&format!(
            "Only {} of {total} parts could be analyzed; mention that the review is partial.\n",
            partials.len()
        ));
    }
    s.push_str("\n[Partial analyses]\n");
    for (index, analysis) in partials {
        s.push_str(&format!("\n### Part {index}\n{}\n", analysis.trim()));
    }
    s.push_str("\n[Output format - replace the < > parts with real content]\n\n");
    s.push_str(OVERVIEW_FORMAT);
    s.push('\n');
    s
}
