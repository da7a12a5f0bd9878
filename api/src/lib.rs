//! HTTP surface of the bot: one webhook endpoint in front of the task
//! dispatcher.

use std::sync::Arc;

mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use ai_llm_service::error_handler::env_or;
use axum::{Router, middleware, routing::post};
use mr_reviewer::{BotSettings, ReviewPipeline, TaskDispatcher};
use tokio::signal;
use tracing::{error, info};

use crate::core::app_state::AppState;
use crate::error_handler::AppError;
use crate::middleware_layer::request_id::with_request_id;
use crate::routes::webhook::webhook_route::gitlab_webhook;

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";

/// Builds the pipeline from `settings` and serves until Ctrl+C.
///
/// Listens on `API_ADDRESS` (default [`DEFAULT_API_ADDRESS`]).
pub async fn start(settings: BotSettings) -> Result<(), AppError> {
    let address = env_or("API_ADDRESS", DEFAULT_API_ADDRESS);

    let pipeline = ReviewPipeline::from_settings(&settings)?;
    pipeline.workspaces().ensure_base().await?;

    let dispatcher = TaskDispatcher::new(pipeline, settings.max_concurrent_tasks);
    let state = Arc::new(AppState::new(settings.router.clone(), dispatcher));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| AppError::Bind {
            address: address.clone(),
            source,
        })?;
    info!(
        %address,
        mention = %settings.router.mention_token,
        auto_review = settings.router.auto_review_on_update,
        max_tasks = settings.max_concurrent_tasks,
        "webhook server listening"
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Router with all endpoints; separate from [`start`] so tests can mount it.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(gitlab_webhook))
        .layer(middleware::from_fn(with_request_id))
        .with_state(state)
}

/// Resolves on Ctrl+C. If the signal handler cannot be installed the server
/// keeps running.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
