use std::sync::Arc;

use crate::config::AppConfig;
use crate::observability::AppMetrics;
use crate::store::Store;

/// Handed to every handler. The store handle is the only process-lifetime
/// resource and is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub metrics: Arc<AppMetrics>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            metrics: Arc::new(AppMetrics::new()),
            config: Arc::new(config),
        }
    }
}
