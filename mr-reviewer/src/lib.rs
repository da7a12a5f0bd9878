//! Public entry for the mr-reviewer pipeline.
//!
//! Turns GitLab webhooks into merge-request tasks and runs them:
//!
//! 1) **Routing** ([`webhook`])
//!    - Classify the payload into a closed set of events (mention, opened,
//!      updated, closed, ignored)
//!    - Answer GitLab immediately with a status token
//!
//! 2) **Scheduling** ([`tasks::queue`])
//!    - Single flight per MR id, submission order preserved
//!    - Global bound on concurrently running tasks
//!
//! 3) **Execution** ([`tasks::ReviewPipeline`])
//!    - Workspace sync via `project_code_store`
//!    - Diff extraction and file-boundary chunking ([`diff`])
//!    - Assistant calls via `ai-llm-service`, map-reduce for large overviews ([`review`])
//!    - Overview parsing ([`parser`]) and publishing to GitLab ([`publish`])
//!
//! Provider and assistant dispatch are concrete types; no `async-trait` and
//! no `Box<dyn ...>`.

pub mod config;
pub mod diff;
pub mod errors;
pub mod parser;
pub mod publish;
pub mod review;
pub mod tasks;
pub mod webhook;

pub use config::{BotSettings, RouterConfig};
pub use errors::{ProviderError, TaskError};
pub use tasks::{ReviewPipeline, TaskDispatcher};
pub use webhook::{MrTask, RouteStatus, Routed, WebhookEvent, route};
