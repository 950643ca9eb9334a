//! Firmware types for the OTA update protocol

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Maximum firmware size: 3MB
pub const MAX_FIRMWARE_SIZE: usize = 3 * 1024 * 1024;

/// Header carrying the MD5 of the sketch currently flashed on an ESP8266
pub const CLIENT_HASH_HEADER: &str = "x-esp8266-sketch-md5";

/// Header carrying the MD5 of the delivered firmware
pub const FIRMWARE_HASH_HEADER: &str = "x-md5";

/// Header carrying the app key on uploads
pub const UPLOAD_KEY_HEADER: &str = "key";

/// Multipart field holding the firmware binary
pub const FIRMWARE_FIELD: &str = "firmware";

// ============================================================================
// Records
// ============================================================================

/// Link between a secret app key and the public name devices request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppRegistration {
    pub key: String,
    pub name: String,
}

impl AppRegistration {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// The single stored firmware image for an app key
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FirmwareRecord {
    pub key: String,

    /// Lowercase hex MD5 of `payload`
    pub hash: String,

    pub payload: Vec<u8>,

    /// RFC 3339 time the record was stored
    pub uploaded_at: String,
}

// Payloads are never written to logs.
impl fmt::Debug for FirmwareRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmwareRecord")
            .field("key", &self.key)
            .field("hash", &self.hash)
            .field("size", &self.payload.len())
            .field("uploaded_at", &self.uploaded_at)
            .finish()
    }
}

// ============================================================================
// Negotiation Types
// ============================================================================

/// How a retrieval request treats the hash reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// Always deliver the stored image
    None,
    /// Skip delivery when the device already runs the stored image
    ClientHash,
}

/// Outcome of version negotiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Device already holds the stored image
    NotModified,
    /// Device needs the stored image
    Deliver { payload: Vec<u8>, hash: String },
}

// ============================================================================
// Upload Types
// ============================================================================

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Digest of the stored payload
    pub hash: String,

    /// Stored payload size in bytes
    pub size: usize,

    /// Whether an earlier image for the key was removed
    pub replaced: bool,
}

// ============================================================================
// Error Types
// ============================================================================

/// What a failed lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// No app registered under the requested name
    Name,
    /// App exists but nothing has been uploaded for it
    Firmware,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Name => f.write_str("Could not find name"),
            Missing::Firmware => f.write_str("No firmware for name"),
        }
    }
}

/// Firmware error types
#[derive(Debug, thiserror::Error)]
pub enum FirmwareError {
    #[error("{0}")]
    NotFound(Missing),

    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Missing key")]
    MissingKey,

    #[error("Bad key")]
    Unauthorized,

    #[error("Missing file")]
    MissingFile,

    #[error("Empty firmware")]
    EmptyPayload,

    #[error("Too big: firmware exceeds {max} bytes")]
    PayloadTooLarge { max: usize },

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl FirmwareError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingHeader(_) => StatusCode::BAD_REQUEST,
            Self::MissingKey => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::EmptyPayload => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(Missing::Name) => "NAME_NOT_FOUND",
            Self::NotFound(Missing::Firmware) => "FIRMWARE_NOT_FOUND",
            Self::MissingHeader(_) => "MISSING_HEADER",
            Self::MissingKey => "MISSING_KEY",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::MissingFile => "MISSING_FILE",
            Self::EmptyPayload => "EMPTY_PAYLOAD",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::InvalidUpload(_) => "INVALID_UPLOAD",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}
