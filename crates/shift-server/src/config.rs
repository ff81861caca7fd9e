//! Server configuration from the environment.

use shift_core::{SeriesError, SeriesLength};
use std::net::{AddrParseError, SocketAddr};
use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_ROOMS: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SERVER_ADDR {value:?} is not a socket address: {source}")]
    InvalidAddr {
        value: String,
        source: AddrParseError,
    },

    #[error("{key} must be a number, got {value:?}")]
    NotANumber { key: &'static str, value: String },

    #[error("SHIFT_SERIES_LENGTH: {0}")]
    SeriesLength(#[from] SeriesError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on (`SERVER_ADDR`)
    pub addr: SocketAddr,
    /// Series length for rooms created without one (`SHIFT_SERIES_LENGTH`)
    pub default_series_length: SeriesLength,
    /// Upper bound on live rooms (`SHIFT_MAX_ROOMS`)
    pub max_rooms: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr_value = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into());
        let addr = addr_value
            .parse()
            .map_err(|source| ConfigError::InvalidAddr {
                value: addr_value.clone(),
                source,
            })?;

        let default_series_length = match lookup("SHIFT_SERIES_LENGTH") {
            Some(value) => {
                let raw: u8 = value.parse().map_err(|_| ConfigError::NotANumber {
                    key: "SHIFT_SERIES_LENGTH",
                    value: value.clone(),
                })?;
                SeriesLength::try_from(raw)?
            }
            None => SeriesLength::One,
        };

        let max_rooms = match lookup("SHIFT_MAX_ROOMS") {
            Some(value) => value.parse().map_err(|_| ConfigError::NotANumber {
                key: "SHIFT_MAX_ROOMS",
                value: value.clone(),
            })?,
            None => DEFAULT_MAX_ROOMS,
        };

        Ok(Self {
            addr,
            default_series_length,
            max_rooms,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            default_series_length: SeriesLength::One,
            max_rooms: DEFAULT_MAX_ROOMS,
        }
    }
}
