//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::firmware::FirmwareRepository;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    repository: Arc<dyn FirmwareRepository>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, repository: Arc<dyn FirmwareRepository>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, repository }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the firmware repository
    pub fn repository(&self) -> &dyn FirmwareRepository {
        self.inner.repository.as_ref()
    }
}
