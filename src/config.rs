//! Configuration management for the Firmware Update Server

use serde::Deserialize;
use std::env;

use crate::error::{AppError, Result};
use crate::firmware::{AppRegistration, MAX_FIRMWARE_SIZE};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub firmware: FirmwareConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirmwareConfig {
    /// Largest accepted upload, in bytes
    pub max_size: usize,
    /// Registrations seeded at startup
    #[serde(default)]
    pub apps: Vec<AppRegistration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./firmware.db".to_string(),
            },
            firmware: FirmwareConfig {
                max_size: MAX_FIRMWARE_SIZE,
                apps: Vec::new(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: match env::var("SERVER_PORT") {
                    Ok(port) => port
                        .parse()
                        .map_err(|_| AppError::Config(format!("Invalid SERVER_PORT: {}", port)))?,
                    Err(_) => defaults.server.port,
                },
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            firmware: FirmwareConfig {
                max_size: match env::var("FIRMWARE_MAX_SIZE") {
                    Ok(size) => size.parse().map_err(|_| {
                        AppError::Config(format!("Invalid FIRMWARE_MAX_SIZE: {}", size))
                    })?,
                    Err(_) => defaults.firmware.max_size,
                },
                apps: match env::var("FIRMWARE_APPS") {
                    Ok(apps) => parse_apps(&apps)?,
                    Err(_) => defaults.firmware.apps,
                },
            },
        })
    }
}

/// Parse `key=name` pairs separated by commas
fn parse_apps(value: &str) -> Result<Vec<AppRegistration>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, name) = entry
                .split_once('=')
                .ok_or_else(|| AppError::Config(format!("Invalid FIRMWARE_APPS entry: {}", entry)))?;
            let (key, name) = (key.trim(), name.trim());
            if key.is_empty() || name.is_empty() {
                return Err(AppError::Config(format!(
                    "Invalid FIRMWARE_APPS entry: {}",
                    entry
                )));
            }
            Ok(AppRegistration::new(key, name))
        })
        .collect()
}
