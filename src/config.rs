//! TOML configuration shared by both binaries.
//!
//! Every field has a default, so an empty file starts both services on their
//! usual ports against the public directory and weather APIs.

use crate::upstream::directory::DIRECTORY_API_BASE;
use crate::upstream::weather_api::WEATHER_API_BASE;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "APP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "app.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub otel_config: OtelConfig,
    pub gateway: GatewayConfig,
    pub resolver: ResolverConfig,
}

impl AppConfig {
    /// Loads from `$APP_CONFIG`, falling back to `app.toml`.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exporter {
    #[default]
    Otlp,
    Stdout,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OtelConfig {
    pub endpoint: String,
    pub exporter: Exporter,
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4317".to_string(),
            exporter: Exporter::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub resolver_url: String,
    pub timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            resolver_url: "http://localhost:8081".to_string(),
            timeout_secs: None,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub host: String,
    pub port: u16,
    pub directory_url: String,
    pub weather_url: String,
    pub timeout_secs: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            directory_url: DIRECTORY_API_BASE.to_string(),
            weather_url: WEATHER_API_BASE.to_string(),
            timeout_secs: None,
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.resolver.port, 8081);
        assert_eq!(config.gateway.resolver_url, "http://localhost:8081");
        assert_eq!(config.resolver.directory_url, DIRECTORY_API_BASE);
        assert_eq!(config.otel_config.exporter, Exporter::Otlp);
        assert!(config.gateway.timeout().is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [otel_config]
            exporter = "stdout"

            [gateway]
            resolver_url = "http://serviceb:8081"
            timeout_secs = 5

            [resolver]
            weather_url = "http://weather.test"
            "#,
        )
        .unwrap();

        assert_eq!(config.otel_config.exporter, Exporter::Stdout);
        assert_eq!(config.otel_config.endpoint, "http://localhost:4317");
        assert_eq!(config.gateway.resolver_url, "http://serviceb:8081");
        assert_eq!(config.gateway.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.resolver.weather_url, "http://weather.test");
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_unknown_exporter_is_rejected() {
        let result = toml::from_str::<AppConfig>("[otel_config]\nexporter = \"zipkin\"\n");
        assert!(result.is_err());
    }
}
