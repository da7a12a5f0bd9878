use mr_reviewer::RouteStatus;
use serde::Serialize;

/// Body of every webhook answer, e.g. `{"status":"overview_queued"}`.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: RouteStatus,
}
