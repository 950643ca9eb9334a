//! Upload authorization by registered app key

use super::repository::FirmwareRepository;
use super::types::FirmwareError;

/// Checks app keys against the registrations in a repository
pub struct AccessControl<'a, R: FirmwareRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: FirmwareRepository + ?Sized> AccessControl<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// True iff an app is registered under exactly this key
    pub async fn authorize(&self, key: &str) -> Result<bool, FirmwareError> {
        self.repo.app_exists(key).await
    }
}
