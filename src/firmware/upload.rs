//! Firmware Upload
//!
//! Validates uploads from release tooling and replaces the stored image for
//! the app key. Preconditions are checked in a fixed order and each has its
//! own error, so tooling can tell a bad key from an oversized image.

use super::access::AccessControl;
use super::hash;
use super::repository::FirmwareRepository;
use super::types::{FirmwareError, UploadResult, MAX_FIRMWARE_SIZE};

/// Stores uploaded firmware in a repository
pub struct UploadEngine<'a, R: FirmwareRepository + ?Sized> {
    repo: &'a R,
    max_size: usize,
}

impl<'a, R: FirmwareRepository + ?Sized> UploadEngine<'a, R> {
    /// Create an engine with the default 3MB limit
    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            max_size: MAX_FIRMWARE_SIZE,
        }
    }

    /// Use a custom size limit
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Validate and store a firmware image for an app key
    pub async fn upload(&self, key: &str, payload: &[u8]) -> Result<UploadResult, FirmwareError> {
        if key.is_empty() {
            return Err(FirmwareError::MissingKey);
        }

        if !AccessControl::new(self.repo).authorize(key).await? {
            tracing::warn!(key = %key, "Upload rejected: unknown app key");
            return Err(FirmwareError::Unauthorized);
        }

        if payload.is_empty() {
            return Err(FirmwareError::EmptyPayload);
        }

        if payload.len() > self.max_size {
            tracing::warn!(
                key = %key,
                size = payload.len(),
                max = self.max_size,
                "Upload rejected: firmware too large"
            );
            return Err(FirmwareError::PayloadTooLarge { max: self.max_size });
        }

        let hash = hash::digest(payload);
        let replaced = self.repo.replace_record(key, &hash, payload).await?;

        Ok(UploadResult {
            hash,
            size: payload.len(),
            replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::memory::MemoryFirmwareRepository;
    use crate::firmware::{AppRegistration, Decision, NegotiationEngine, VersionCheck};

    async fn setup_repo() -> MemoryFirmwareRepository {
        MemoryFirmwareRepository::with_apps(&[AppRegistration::new("abc123", "door_opener")]).await
    }

    #[tokio::test]
    async fn test_upload_then_negotiate() {
        let repo = setup_repo().await;
        let payload = [0x01u8, 0x02, 0x03];

        let result = UploadEngine::new(&repo).upload("abc123", &payload).await.unwrap();
        assert_eq!(result.hash, hash::digest(&payload));
        assert_eq!(result.size, 3);
        assert!(!result.replaced);

        let stored = repo.get_record("abc123").await.unwrap().unwrap();
        assert_eq!(stored.hash, hash::digest(&payload));
        assert_eq!(stored.payload, payload);

        let engine = NegotiationEngine::new(&repo, VersionCheck::ClientHash);
        assert_eq!(
            engine.resolve("door_opener", Some(&result.hash)).await.unwrap(),
            Decision::NotModified
        );
        assert_eq!(
            engine.resolve("door_opener", Some("deadbeef")).await.unwrap(),
            Decision::Deliver {
                payload: payload.to_vec(),
                hash: result.hash.clone(),
            }
        );
    }

    #[tokio::test]
    async fn test_second_upload_replaces_first() {
        let repo = setup_repo().await;
        let engine = UploadEngine::new(&repo);

        let first = engine.upload("abc123", b"firmware v1").await.unwrap();
        let second = engine.upload("abc123", b"firmware v2").await.unwrap();
        assert!(second.replaced);
        assert_ne!(first.hash, second.hash);

        assert_eq!(repo.record_count().await, 1);
        let stored = repo.get_record("abc123").await.unwrap().unwrap();
        assert_eq!(stored.payload, b"firmware v2");
        assert_eq!(stored.hash, second.hash);

        let negotiation = NegotiationEngine::new(&repo, VersionCheck::ClientHash);
        let decision = negotiation.resolve("door_opener", Some(&first.hash)).await.unwrap();
        assert_eq!(
            decision,
            Decision::Deliver {
                payload: b"firmware v2".to_vec(),
                hash: second.hash,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_key() {
        let repo = setup_repo().await;
        let result = UploadEngine::new(&repo).upload("", b"data").await;
        assert!(matches!(result, Err(FirmwareError::MissingKey)));
    }

    #[tokio::test]
    async fn test_unregistered_key_is_unauthorized() {
        let repo = setup_repo().await;
        let engine = UploadEngine::new(&repo);

        let oversized = vec![0u8; MAX_FIRMWARE_SIZE + 1];
        let payloads: [&[u8]; 3] = [b"data", b"", &oversized];
        for payload in payloads {
            let result = engine.upload("not-registered", payload).await;
            assert!(matches!(result, Err(FirmwareError::Unauthorized)));
        }
        assert_eq!(repo.record_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let repo = setup_repo().await;
        let result = UploadEngine::new(&repo).upload("abc123", &[]).await;
        assert!(matches!(result, Err(FirmwareError::EmptyPayload)));
        assert_eq!(repo.record_count().await, 0);
    }

    #[tokio::test]
    async fn test_size_boundary() {
        let repo = setup_repo().await;
        let engine = UploadEngine::new(&repo);

        let at_limit = vec![0xFFu8; 3 * 1024 * 1024];
        let result = engine.upload("abc123", &at_limit).await.unwrap();
        assert_eq!(result.size, 3_145_728);

        let over_limit = vec![0xEEu8; 3 * 1024 * 1024 + 1];
        let result = engine.upload("abc123", &over_limit).await;
        assert!(matches!(
            result,
            Err(FirmwareError::PayloadTooLarge { max: 3_145_728 })
        ));

        // The rejected upload left the earlier image in place
        let stored = repo.get_record("abc123").await.unwrap().unwrap();
        assert_eq!(stored.payload.len(), 3_145_728);
        assert_eq!(stored.payload[0], 0xFF);
    }

    #[tokio::test]
    async fn test_custom_max_size() {
        let repo = setup_repo().await;
        let engine = UploadEngine::new(&repo).with_max_size(4);

        assert!(engine.upload("abc123", b"1234").await.is_ok());
        assert!(matches!(
            engine.upload("abc123", b"12345").await,
            Err(FirmwareError::PayloadTooLarge { max: 4 })
        ));
    }
}
