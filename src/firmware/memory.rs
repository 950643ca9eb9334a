//! In-memory firmware repository used by tests

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::repository::FirmwareRepository;
use super::types::{AppRegistration, FirmwareError, FirmwareRecord};

#[derive(Clone, Default)]
pub struct MemoryFirmwareRepository {
    inner: Arc<MemoryRepositoryInner>,
}

#[derive(Default)]
struct MemoryRepositoryInner {
    /// Registered apps indexed by key
    apps: RwLock<HashMap<String, AppRegistration>>,

    /// Stored firmware indexed by key
    firmware: RwLock<HashMap<String, FirmwareRecord>>,
}

impl MemoryFirmwareRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with apps already registered
    pub async fn with_apps(apps: &[AppRegistration]) -> Self {
        let repo = Self::new();
        {
            let mut registered = repo.inner.apps.write().await;
            for app in apps {
                registered.insert(app.key.clone(), app.clone());
            }
        }
        repo
    }

    /// Number of stored firmware records
    pub async fn record_count(&self) -> usize {
        self.inner.firmware.read().await.len()
    }
}

#[async_trait::async_trait]
impl FirmwareRepository for MemoryFirmwareRepository {
    async fn lookup_key_by_name(&self, name: &str) -> Result<Option<String>, FirmwareError> {
        let apps = self.inner.apps.read().await;
        Ok(apps
            .values()
            .find(|app| app.name == name)
            .map(|app| app.key.clone()))
    }

    async fn app_exists(&self, key: &str) -> Result<bool, FirmwareError> {
        Ok(self.inner.apps.read().await.contains_key(key))
    }

    async fn get_record(&self, key: &str) -> Result<Option<FirmwareRecord>, FirmwareError> {
        Ok(self.inner.firmware.read().await.get(key).cloned())
    }

    async fn replace_record(
        &self,
        key: &str,
        hash: &str,
        payload: &[u8],
    ) -> Result<bool, FirmwareError> {
        let record = FirmwareRecord {
            key: key.to_string(),
            hash: hash.to_string(),
            payload: payload.to_vec(),
            uploaded_at: Utc::now().to_rfc3339(),
        };

        let previous = self.inner.firmware.write().await.insert(key.to_string(), record);
        Ok(previous.is_some())
    }
}
