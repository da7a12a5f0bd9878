use mr_reviewer::{RouterConfig, TaskDispatcher};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Webhook classification rules (mention token, auto review).
    pub router: RouterConfig,
    /// Queue that runs classified tasks in the background.
    pub dispatcher: TaskDispatcher,
}

impl AppState {
    pub fn new(router: RouterConfig, dispatcher: TaskDispatcher) -> Self {
        Self { router, dispatcher }
    }
}
