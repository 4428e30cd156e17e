use std::sync::Arc;

use docsheet_core::AppConfig;
use docsheet_workflow::Workflow;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub workflow: Arc<Workflow>,
}
