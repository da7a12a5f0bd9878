//! Request id middleware.
//!
//! Every request runs inside a span carrying a request id: an incoming
//! `X-Request-Id`, else GitLab's `X-Gitlab-Event-UUID`, else a timestamp-based
//! id. The id is echoed back in `X-Request-Id`.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const GITLAB_EVENT_HEADER: &str = "x-gitlab-event-uuid";

fn request_id(req: &Request<Body>) -> String {
    for name in [REQUEST_ID_HEADER, GITLAB_EVENT_HEADER] {
        if let Some(v) = req.headers().get(name).and_then(|h| h.to_str().ok()) {
            if !v.trim().is_empty() {
                return v.trim().to_string();
            }
        }
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    format!("req-{nanos}")
}

pub async fn with_request_id(req: Request<Body>, next: Next) -> Response {
    let id = request_id(&req);
    let span = tracing::info_span!("http", request_id = %id, path = %req.uri().path());

    let mut res = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
