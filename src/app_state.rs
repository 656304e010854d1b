use std::sync::Arc;

use crate::services::driver::IntakeService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<IntakeService>,
}

impl AppState {
    pub fn new(intake: IntakeService) -> Self {
        Self {
            intake: Arc::new(intake),
        }
    }
}
