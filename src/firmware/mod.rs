//! Firmware Negotiation and Upload Core
//!
//! Implements the OTA update protocol independently of HTTP and storage:
//! - MD5 content digests for stored images
//! - Version negotiation against the hash reported by a device
//! - Authorized, size-bounded uploads that atomically replace the
//!   single stored image for an app key
//!
//! Every engine borrows a [`FirmwareRepository`]; the server injects the
//! SQLite implementation, tests inject an in-memory one.

pub mod access;
pub mod hash;
#[cfg(test)]
pub mod memory;
pub mod negotiation;
pub mod repository;
pub mod types;
pub mod upload;

pub use access::AccessControl;
pub use negotiation::NegotiationEngine;
pub use repository::FirmwareRepository;
pub use types::*;
pub use upload::UploadEngine;
