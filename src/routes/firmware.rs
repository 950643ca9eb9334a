//! Firmware Routes
//!
//! HTTP endpoints for OTA devices and release tooling.
//!
//! Endpoints:
//! - GET /get/:name - Always send the current firmware
//! - GET /get-esp/:name - Send firmware unless the ESP8266 already runs it
//! - POST /upload - Replace the firmware for the app key in the `key` header
//!
//! `curl -F "firmware=@firmware.bin" -H "key: <app key>" http://host/upload`

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::firmware::{
    AccessControl, Decision, FirmwareError, NegotiationEngine, UploadEngine, VersionCheck,
    CLIENT_HASH_HEADER, FIRMWARE_FIELD, FIRMWARE_HASH_HEADER, UPLOAD_KEY_HEADER,
};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the firmware limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

// ============================================================================
// Error Response
// ============================================================================

impl IntoResponse for FirmwareError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let FirmwareError::Storage(ref detail) = self {
            tracing::error!(code = self.code(), "Storage error: {}", detail);
            return (status, "Storage error").into_response();
        }

        tracing::debug!(code = self.code(), status = %status, "Request rejected: {}", self);
        (status, self.to_string()).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the firmware router
pub fn router(max_size: usize) -> Router<AppState> {
    Router::new()
        .route("/get/:name", get(get_firmware))
        .route("/get-esp/:name", get(get_firmware_esp))
        .route("/upload", post(upload_firmware))
        .layer(DefaultBodyLimit::max(max_size.saturating_add(MULTIPART_OVERHEAD)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /get/:name
///
/// Retrieve firmware with no version check.
async fn get_firmware(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, FirmwareError> {
    let decision = NegotiationEngine::new(state.repository(), VersionCheck::None)
        .resolve(&name, None)
        .await?;

    decision_response(decision)
}

/// GET /get-esp/:name
///
/// Endpoint for the ESP8266 OTA updater, which reports the MD5 of its
/// running sketch. Answers 302 with an empty body when that is current.
async fn get_firmware_esp(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, FirmwareError> {
    // A value that is not visible ASCII can never equal a hex digest
    let client_hash = headers
        .get(CLIENT_HASH_HEADER)
        .map(|value| value.to_str().unwrap_or_default());

    // Unknown names and missing firmware are reported before the header
    let decision = NegotiationEngine::new(state.repository(), VersionCheck::ClientHash)
        .resolve(&name, client_hash)
        .await?;

    if client_hash.is_none() {
        tracing::warn!(name = %name, "Version check without {} header", CLIENT_HASH_HEADER);
        return Err(FirmwareError::MissingHeader(CLIENT_HASH_HEADER));
    }

    decision_response(decision)
}

/// POST /upload
///
/// Upload a new copy of the firmware. Needs a multipart file field called
/// `firmware` and a `key` header holding the secret app key.
async fn upload_firmware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<&'static str, FirmwareError> {
    let key = headers
        .get(UPLOAD_KEY_HEADER)
        .ok_or(FirmwareError::MissingKey)?
        .to_str()
        .map_err(|_| FirmwareError::Unauthorized)?
        .to_string();

    if key.is_empty() {
        return Err(FirmwareError::MissingKey);
    }

    // Turn away unknown keys before buffering the body
    if !AccessControl::new(state.repository()).authorize(&key).await? {
        tracing::warn!(key = %key, "Upload rejected for unregistered key");
        return Err(FirmwareError::Unauthorized);
    }

    let max_size = state.config().firmware.max_size;
    let payload = read_firmware_field(&mut multipart, max_size).await?;

    let result = UploadEngine::new(state.repository())
        .with_max_size(max_size)
        .upload(&key, &payload)
        .await?;

    tracing::info!(
        key = %key,
        hash = %result.hash,
        size = result.size,
        replaced = result.replaced,
        "Firmware stored"
    );

    Ok("Ok")
}

// ============================================================================
// Helpers
// ============================================================================

/// Turn a negotiation decision into a response
fn decision_response(decision: Decision) -> Result<Response, FirmwareError> {
    match decision {
        // Already have most recent firmware
        Decision::NotModified => Ok(StatusCode::FOUND.into_response()),
        Decision::Deliver { payload, hash } => {
            let hash = HeaderValue::from_str(&hash)
                .map_err(|e| FirmwareError::Storage(format!("Unusable stored hash: {}", e)))?;

            // Vec<u8> bodies are sent as application/octet-stream
            let mut response = payload.into_response();
            response
                .headers_mut()
                .insert(HeaderName::from_static(FIRMWARE_HASH_HEADER), hash);
            Ok(response)
        }
    }
}

/// Pull the firmware file out of the multipart body
async fn read_firmware_field(
    multipart: &mut Multipart,
    max_size: usize,
) -> Result<Bytes, FirmwareError> {
    let to_firmware_error = |err| multipart_error(err, max_size);

    while let Some(field) = multipart.next_field().await.map_err(to_firmware_error)? {
        let name = field.name().unwrap_or("").to_string();
        if name != FIRMWARE_FIELD {
            tracing::debug!(field = %name, "Skipping multipart field");
            continue;
        }

        return field.bytes().await.map_err(to_firmware_error);
    }

    tracing::warn!("No {} field found in multipart upload", FIRMWARE_FIELD);
    Err(FirmwareError::MissingFile)
}

fn multipart_error(err: MultipartError, max_size: usize) -> FirmwareError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload body exceeded the request limit");
        return FirmwareError::PayloadTooLarge { max: max_size };
    }

    tracing::warn!("Failed to read multipart upload: {}", err);
    FirmwareError::InvalidUpload(err.body_text())
}
