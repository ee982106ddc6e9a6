use std::sync::Arc;

use cadence_agent::Controller;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The controller is stateless between runs, so one instance built at
/// startup serves every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub controller: Arc<Controller>,
}

impl AppState {
    pub fn new(config: Config, controller: Controller) -> Self {
        Self {
            config: Arc::new(config),
            controller: Arc::new(controller),
        }
    }
}
