use std::sync::Arc;

use crate::config::RuntimeConfigManager;
use crate::engine::GameTable;

/// Shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<GameTable>,
    pub config_manager: RuntimeConfigManager,
}

impl AppState {
    pub fn new(table: Arc<GameTable>) -> Self {
        let config_manager = table.config().clone();
        Self { table, config_manager }
    }
}
