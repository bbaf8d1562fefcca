use std::sync::Arc;

use docenrich::JobSupervisor;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<JobSupervisor>,
}

impl AppState {
    pub fn new(supervisor: JobSupervisor) -> Self {
        Self {
            supervisor: Arc::new(supervisor),
        }
    }
}
