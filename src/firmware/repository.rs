//! Firmware Repository
//!
//! Storage interface the negotiation and upload engines run against.

use super::types::{FirmwareError, FirmwareRecord};

/// Trait for firmware storage backends
#[async_trait::async_trait]
pub trait FirmwareRepository: Send + Sync {
    /// Resolve the public name of an app to its key
    async fn lookup_key_by_name(&self, name: &str) -> Result<Option<String>, FirmwareError>;

    /// Check whether an app is registered under this exact key
    async fn app_exists(&self, key: &str) -> Result<bool, FirmwareError>;

    /// Get the stored firmware for a key
    async fn get_record(&self, key: &str) -> Result<Option<FirmwareRecord>, FirmwareError>;

    /// Replace the stored firmware for a key in a single transaction
    ///
    /// Returns whether a previous record existed. Readers observe either the
    /// old record or the new one, never both and never neither.
    async fn replace_record(
        &self,
        key: &str,
        hash: &str,
        payload: &[u8],
    ) -> Result<bool, FirmwareError>;
}
