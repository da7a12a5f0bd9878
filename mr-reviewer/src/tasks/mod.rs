//! Task execution: one webhook event, one sequential pipeline.
//!
//! | event     | stages                                                        |
//! |-----------|---------------------------------------------------------------|
//! | comment   | sync → assistant (question prompt) → note                     |
//! | review    | sync → diff (capped) → assistant (review prompt) → note       |
//! | overview  | sync → diff → single pass or map-reduce → parse → MR update   |
//! | cleanup   | remove workspace                                              |
//!
//! The assistant always runs read-only, so the workspace only ever changes
//! through git. The first failing stage ends the task; the error is logged
//! and nothing is published.

pub mod queue;

use std::path::Path;
use std::sync::Arc;

use ai_llm_service::{AiderService, AnswerKind};
use project_code_store::WorkspaceCache;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::config::BotSettings;
use crate::diff::{DiffResult, extract_diff};
use crate::errors::{ProviderError, TaskError, TaskResult};
use crate::parser::parse_overview;
use crate::publish::GitLabPublisher;
use crate::review::prompt::{question_prompt, review_prompt};
use crate::review::summarize::generate_overview;
use crate::webhook::{MrTask, WebhookEvent};

use queue::TaskQueue;

/// Collaborators for every task stage.
#[derive(Debug)]
pub struct ReviewPipeline {
    workspaces: WorkspaceCache,
    aider: AiderService,
    publisher: GitLabPublisher,
    diff_max_chars: usize,
}

impl ReviewPipeline {
    pub fn new(
        workspaces: WorkspaceCache,
        aider: AiderService,
        publisher: GitLabPublisher,
        diff_max_chars: usize,
    ) -> Self {
        Self {
            workspaces,
            aider,
            publisher,
            diff_max_chars: diff_max_chars.max(1),
        }
    }

    pub fn from_settings(settings: &BotSettings) -> Result<Self, ProviderError> {
        let workspaces = WorkspaceCache::new(
            &settings.workspace_base,
            &settings.gitlab.project_path,
            settings.gitlab.remote_url(),
            settings.git_timeout,
        );
        let publisher = GitLabPublisher::new(
            &settings.gitlab.api_base(),
            &settings.gitlab.token,
            settings.http_timeout,
        )?;
        Ok(Self::new(
            workspaces,
            AiderService::new(settings.assistant.clone()),
            publisher,
            settings.diff_max_chars,
        ))
    }

    pub fn workspaces(&self) -> &WorkspaceCache {
        &self.workspaces
    }

    /// Runs a task to completion or to its first failing stage. Never panics
    /// on stage failures; they are logged here.
    #[instrument(name = "mr_task", skip_all, fields(mr = %task.mr_id(), kind = task.kind()))]
    pub async fn run(&self, task: MrTask) {
        info!("task started");
        match self.execute(&task).await {
            Ok(()) => info!("task finished"),
            Err(e) => error!(error = %e, "task stopped"),
        }
    }

    pub async fn execute(&self, task: &MrTask) -> TaskResult<()> {
        match &task.event {
            WebhookEvent::Ignored => Ok(()),

            WebhookEvent::MergeRequestClosed { mr_id } => {
                self.workspaces.cleanup(mr_id).await;
                Ok(())
            }

            WebhookEvent::MentionComment {
                mr_id,
                source_branch,
                question,
                ..
            } => {
                let (project, source) =
                    preconditions(task.project_id.as_deref(), source_branch.as_deref())?;
                let ws = self.workspaces.sync(mr_id, source).await?;

                let answer = self
                    .ask(&question_prompt(question), &ws, AnswerKind::Question)
                    .await?;
                self.publisher.post_note(project, mr_id, &answer).await?;
                Ok(())
            }

            WebhookEvent::MergeRequestUpdated {
                mr_id,
                source_branch,
                target_branch,
            } => {
                let (project, source) =
                    preconditions(task.project_id.as_deref(), source_branch.as_deref())?;
                let ws = self.workspaces.sync(mr_id, source).await?;
                let diff = self
                    .diff(&ws, source, target_branch)
                    .await?
                    .capped(self.diff_max_chars);
                if diff.truncated {
                    warn!(
                        kept = diff.len_chars(),
                        total = diff.original_length,
                        "diff capped for review"
                    );
                }

                let review = self
                    .ask(&review_prompt(&diff, None), &ws, AnswerKind::Report)
                    .await?;
                self.publisher.post_note(project, mr_id, &review).await?;
                Ok(())
            }

            WebhookEvent::MergeRequestOpened {
                mr_id,
                source_branch,
                target_branch,
                original_title,
            } => {
                let (project, source) =
                    preconditions(task.project_id.as_deref(), source_branch.as_deref())?;
                let ws = self.workspaces.sync(mr_id, source).await?;
                let diff = self.diff(&ws, source, target_branch).await?;

                let aider = &self.aider;
                let ws_path = ws.as_path();
                let raw = generate_overview(
                    &diff,
                    self.diff_max_chars,
                    original_title,
                    move |prompt: String| async move {
                        aider.invoke(&prompt, ws_path, AnswerKind::Report).await
                    },
                )
                .await?;

                let overview = parse_overview(&raw);
                self.publisher
                    .update_overview(project, mr_id, &overview)
                    .await?;
                Ok(())
            }
        }
    }

    async fn diff(&self, ws: &Path, source: &str, target: &str) -> TaskResult<DiffResult> {
        let diff = extract_diff(&self.workspaces, ws, source, target)
            .await
            .ok_or_else(|| TaskError::DiffUnavailable {
                target: target.to_string(),
            })?;
        if diff.is_empty() {
            warn!(source, target, "diff is empty");
        }
        Ok(diff)
    }

    async fn ask(&self, prompt: &str, ws: &Path, kind: AnswerKind) -> TaskResult<String> {
        self.aider
            .invoke(prompt, ws, kind)
            .await
            .ok_or(TaskError::Assistant)
    }
}

/// Project id and source branch are required before the workspace is touched.
fn preconditions<'a>(
    project_id: Option<&'a str>,
    source_branch: Option<&'a str>,
) -> TaskResult<(&'a str, &'a str)> {
    let project = project_id
        .filter(|p| !p.is_empty())
        .ok_or(TaskError::MissingProjectId)?;
    let source = source_branch
        .filter(|b| !b.is_empty())
        .ok_or(TaskError::MissingSourceBranch)?;
    Ok((project, source))
}

/// Entry point used by the HTTP layer: queue + pipeline.
#[derive(Clone)]
pub struct TaskDispatcher {
    queue: TaskQueue,
    pipeline: Arc<ReviewPipeline>,
}

impl TaskDispatcher {
    pub fn new(pipeline: ReviewPipeline, max_concurrent: usize) -> Self {
        Self {
            queue: TaskQueue::new(max_concurrent),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &ReviewPipeline {
        &self.pipeline
    }

    /// Queues `task` behind earlier tasks of the same MR and returns at once.
    pub fn submit(&self, task: MrTask) -> JoinHandle<()> {
        let key = task.mr_id().to_string();
        let pipeline = Arc::clone(&self.pipeline);
        info!(mr = %key, kind = task.kind(), "task queued");
        self.queue
            .spawn_keyed(&key, async move { pipeline.run(task).await })
    }
}
