//! GitLab webhook classification.
//!
//! [`classify`] is a pure function from an untyped payload to a closed set of
//! [`WebhookEvent`] variants; [`route`] adds the project id and the status
//! token returned synchronously to GitLab.
//!
//! Rules, in order:
//! - `note` with a `merge_request` whose body mentions the token → [`WebhookEvent::MentionComment`]
//! - `merge_request` with `action == "open"` → [`WebhookEvent::MergeRequestOpened`]
//! - `merge_request` with `action == "update"` and auto review on → [`WebhookEvent::MergeRequestUpdated`]
//! - `merge_request` closed/merged (state or action) → [`WebhookEvent::MergeRequestClosed`]
//! - anything else → [`WebhookEvent::Ignored`]

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::RouterConfig;

/// Target branch assumed when the payload omits it.
pub const DEFAULT_TARGET_BRANCH: &str = "main";

/// Merge-request iid as text; partitions all workspace and task state.
pub type MergeRequestId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    MentionComment {
        mr_id: MergeRequestId,
        source_branch: Option<String>,
        target_branch: String,
        question: String,
    },
    MergeRequestOpened {
        mr_id: MergeRequestId,
        source_branch: Option<String>,
        target_branch: String,
        original_title: String,
    },
    MergeRequestUpdated {
        mr_id: MergeRequestId,
        source_branch: Option<String>,
        target_branch: String,
    },
    MergeRequestClosed {
        mr_id: MergeRequestId,
    },
    Ignored,
}

impl WebhookEvent {
    pub fn mr_id(&self) -> Option<&str> {
        match self {
            WebhookEvent::MentionComment { mr_id, .. }
            | WebhookEvent::MergeRequestOpened { mr_id, .. }
            | WebhookEvent::MergeRequestUpdated { mr_id, .. }
            | WebhookEvent::MergeRequestClosed { mr_id } => Some(mr_id),
            WebhookEvent::Ignored => None,
        }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookEvent::MentionComment { .. } => "comment",
            WebhookEvent::MergeRequestOpened { .. } => "overview",
            WebhookEvent::MergeRequestUpdated { .. } => "review",
            WebhookEvent::MergeRequestClosed { .. } => "cleanup",
            WebhookEvent::Ignored => "ignored",
        }
    }

    pub fn status(&self) -> RouteStatus {
        match self {
            WebhookEvent::MentionComment { .. } => RouteStatus::Queued,
            WebhookEvent::MergeRequestOpened { .. } => RouteStatus::OverviewQueued,
            WebhookEvent::MergeRequestUpdated { .. } => RouteStatus::AutoReviewQueued,
            WebhookEvent::MergeRequestClosed { .. } => RouteStatus::CleanupQueued,
            WebhookEvent::Ignored => RouteStatus::Ignored,
        }
    }
}

/// Status token answered to every webhook call (always HTTP 200).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Ignored,
    Queued,
    AutoReviewQueued,
    OverviewQueued,
    CleanupQueued,
}

/// A classified event bound to its project, ready for the task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrTask {
    pub project_id: Option<String>,
    pub event: WebhookEvent,
}

impl MrTask {
    pub fn mr_id(&self) -> &str {
        self.event.mr_id().unwrap_or_default()
    }

    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub status: RouteStatus,
    /// `None` for ignored events.
    pub task: Option<MrTask>,
}

/// Classifies a payload and attaches the project id.
pub fn route(payload: &Value, cfg: &RouterConfig) -> Routed {
    let project_id = project_id(payload);
    let event = classify(payload, cfg);
    let object_kind = payload
        .get("object_kind")
        .and_then(Value::as_str)
        .unwrap_or("-");
    info!(
        object_kind,
        project = project_id.as_deref().unwrap_or("-"),
        kind = event.kind(),
        mr = event.mr_id().unwrap_or("-"),
        "webhook received"
    );

    let status = event.status();
    let task = match event {
        WebhookEvent::Ignored => None,
        event => Some(MrTask { project_id, event }),
    };
    Routed { status, task }
}

/// Pure classification; see the module docs for the rules.
pub fn classify(payload: &Value, cfg: &RouterConfig) -> WebhookEvent {
    match payload.get("object_kind").and_then(Value::as_str) {
        Some("note") => classify_note(payload, cfg),
        Some("merge_request") => classify_merge_request(payload, cfg),
        _ => WebhookEvent::Ignored,
    }
}

fn classify_note(payload: &Value, cfg: &RouterConfig) -> WebhookEvent {
    let Some(mr) = payload.get("merge_request").filter(|v| v.is_object()) else {
        return WebhookEvent::Ignored;
    };
    let note = payload
        .pointer("/object_attributes/note")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let token = cfg.mention_token.to_lowercase();
    if token.is_empty() || !note.to_lowercase().contains(&token) {
        return WebhookEvent::Ignored;
    }

    let Some(mr_id) = text_field(mr, "iid") else {
        warn!("mention on merge request without iid, ignoring");
        return WebhookEvent::Ignored;
    };

    WebhookEvent::MentionComment {
        mr_id,
        source_branch: text_field(mr, "source_branch"),
        target_branch: target_branch(mr),
        question: strip_mention(note, &cfg.mention_token),
    }
}

fn classify_merge_request(payload: &Value, cfg: &RouterConfig) -> WebhookEvent {
    let attrs = payload.get("object_attributes").unwrap_or(&Value::Null);
    let action = attrs.get("action").and_then(Value::as_str).unwrap_or_default();
    let state = attrs.get("state").and_then(Value::as_str).unwrap_or_default();

    let Some(mr_id) = text_field(attrs, "iid") else {
        if !action.is_empty() || !state.is_empty() {
            warn!(action, state, "merge request event without iid, ignoring");
        }
        return WebhookEvent::Ignored;
    };

    if action == "open" {
        return WebhookEvent::MergeRequestOpened {
            mr_id,
            source_branch: text_field(attrs, "source_branch"),
            target_branch: target_branch(attrs),
            original_title: text_field(attrs, "title").unwrap_or_default(),
        };
    }
    if action == "update" && cfg.auto_review_on_update {
        return WebhookEvent::MergeRequestUpdated {
            mr_id,
            source_branch: text_field(attrs, "source_branch"),
            target_branch: target_branch(attrs),
        };
    }
    if matches!(state, "closed" | "merged") || matches!(action, "close" | "merge") {
        return WebhookEvent::MergeRequestClosed { mr_id };
    }
    WebhookEvent::Ignored
}

/// `project_id`, else `project.id`, coerced to text.
pub fn project_id(payload: &Value) -> Option<String> {
    text_field(payload, "project_id").or_else(|| {
        payload
            .get("project")
            .and_then(|p| text_field(p, "id"))
    })
}

/// Lower-cases the comment, removes every occurrence of `token` and trims.
pub fn strip_mention(note: &str, token: &str) -> String {
    let note = note.to_lowercase();
    let token = token.to_lowercase();
    if token.is_empty() {
        return note.trim().to_string();
    }
    note.replace(&token, "").trim().to_string()
}

fn target_branch(obj: &Value) -> String {
    text_field(obj, "target_branch").unwrap_or_else(|| DEFAULT_TARGET_BRANCH.to_string())
}

/// Non-empty string or number field as text.
fn text_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
