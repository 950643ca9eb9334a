//! Infrastructure error types for the Firmware Update Server
//!
//! Request-scoped failures live in [`crate::firmware::FirmwareError`]; the
//! errors here only occur while the server is starting up.

use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
