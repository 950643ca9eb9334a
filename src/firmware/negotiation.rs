//! Version Negotiation
//!
//! Decides whether a device asking for a firmware name needs the stored
//! image, by comparing the MD5 it reports against the stored digest.

use super::repository::FirmwareRepository;
use super::types::{Decision, FirmwareError, Missing, VersionCheck};

/// Resolves firmware names against a repository
pub struct NegotiationEngine<'a, R: FirmwareRepository + ?Sized> {
    repo: &'a R,
    mode: VersionCheck,
}

impl<'a, R: FirmwareRepository + ?Sized> NegotiationEngine<'a, R> {
    pub fn new(repo: &'a R, mode: VersionCheck) -> Self {
        Self { repo, mode }
    }

    /// Resolve a name to a delivery decision
    ///
    /// With [`VersionCheck::None`] the client hash is ignored and the image
    /// is always delivered. Otherwise a client hash equal to the stored one
    /// (case-sensitive) yields [`Decision::NotModified`].
    pub async fn resolve(
        &self,
        name: &str,
        client_hash: Option<&str>,
    ) -> Result<Decision, FirmwareError> {
        let key = self.repo.lookup_key_by_name(name).await?.ok_or_else(|| {
            tracing::warn!(name = %name, "Could not find name in app registrations");
            FirmwareError::NotFound(Missing::Name)
        })?;

        let record = self.repo.get_record(&key).await?.ok_or_else(|| {
            tracing::warn!(name = %name, key = %key, "No firmware stored for app");
            FirmwareError::NotFound(Missing::Firmware)
        })?;

        if self.mode == VersionCheck::ClientHash && client_hash == Some(record.hash.as_str()) {
            tracing::debug!(name = %name, hash = %record.hash, "Device firmware is current");
            return Ok(Decision::NotModified);
        }

        tracing::debug!(
            name = %name,
            hash = %record.hash,
            client_hash = ?client_hash,
            size = record.payload.len(),
            "Delivering firmware"
        );

        Ok(Decision::Deliver {
            payload: record.payload,
            hash: record.hash,
        })
    }
}
