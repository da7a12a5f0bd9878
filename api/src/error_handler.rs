use ai_llm_service::AiLlmError;
use mr_reviewer::ProviderError;
use project_code_store::SyncError;
use thiserror::Error;

/// Startup and server errors. Webhook handling itself never fails: every
/// request is answered with 200 and a status token.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] AiLlmError),

    #[error("failed to build GitLab client: {0}")]
    Provider(#[from] ProviderError),

    #[error("workspace base unavailable: {0}")]
    Workspace(#[from] SyncError),

    #[error("failed to bind listener on {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),
}
