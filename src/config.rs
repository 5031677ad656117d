//! Application-level configuration loading: storage backend selection and the store-local day.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::{Deserialize, Serialize};
use time::UtcOffset;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "STUDY_JOURNAL_CONFIG_PATH";
/// Largest offset (±18h) accepted for the store-local day.
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Which [`crate::dao::store::DataStore`] implementation the binary installs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local tree, lost on restart.
    #[default]
    Memory,
    /// Firebase Realtime Database configured from the environment.
    Firebase,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    store: StoreBackend,
    day_offset: UtcOffset,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        store = ?app_config.store,
                        offset = ?app_config.day_offset,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse the JSON document, rejecting offsets the calendar cannot represent.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        raw.try_into()
    }

    /// Configured storage backend.
    pub fn store(&self) -> StoreBackend {
        self.store
    }

    /// Offset from UTC used to decide which calendar day "today" is.
    pub fn day_offset(&self) -> UtcOffset {
        self.day_offset
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::default(),
            day_offset: UtcOffset::UTC,
        }
    }
}

/// Errors raised while decoding the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),
    #[error("utc_offset_minutes {0} is out of range")]
    Offset(i32),
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    store: StoreBackend,
    #[serde(default)]
    utc_offset_minutes: i32,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        let minutes = value.utc_offset_minutes;
        if minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::Offset(minutes));
        }
        let day_offset = UtcOffset::from_whole_seconds(minutes * 60)
            .map_err(|_| ConfigError::Offset(minutes))?;
        Ok(Self {
            store: value.store,
            day_offset,
        })
    }
}

/// Public web parameters of the hosted backend, handed to browser clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebClientConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub database_url: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::parse("{}").unwrap();
        assert_eq!(config.store(), StoreBackend::Memory);
        assert_eq!(config.day_offset(), UtcOffset::UTC);
    }

    #[test]
    fn parses_backend_and_offset() {
        let config =
            AppConfig::parse(r#"{ "store": "firebase", "utc_offset_minutes": 360 }"#).unwrap();
        assert_eq!(config.store(), StoreBackend::Firebase);
        assert_eq!(config.day_offset().whole_hours(), 6);
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let err = AppConfig::parse(r#"{ "utc_offset_minutes": 2000 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Offset(2000)));
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(AppConfig::parse(r#"{ "store": "couch" }"#).is_err());
    }
}
