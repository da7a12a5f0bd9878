use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;
use tracing::warn;

use crate::core::app_state::AppState;
use crate::routes::webhook::webhook_response::WebhookResponse;

/// `POST /webhook`
///
/// Classifies the GitLab event, queues the resulting task and answers at
/// once. Bodies that are not JSON are treated as unknown events.
pub async fn gitlab_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<WebhookResponse> {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, bytes = body.len(), "webhook body is not JSON");
            Value::Null
        }
    };

    let routed = mr_reviewer::route(&payload, &state.router);
    if let Some(task) = routed.task {
        // Task outcome is logged by the pipeline; the handle is not awaited.
        drop(state.dispatcher.submit(task));
    }

    Json(WebhookResponse {
        status: routed.status,
    })
}
