//! Configuration module for the dashboard
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all optional values. CLI flags and `--set`
//! overrides are applied on top by the binary.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Metrics-store address used when the backend does not report one.
pub const DEFAULT_PROMETHEUS_URL: &str = "http://127.0.0.1:9090";

/// Grafana address shown in the links panel.
pub const DEFAULT_GRAFANA_URL: &str = "http://127.0.0.1:3000";

/// Default demo-ui backend address.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8088";

/// Default refresh period in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 6000;

/// Smallest refresh period accepted by [`Config::validate`].
pub const MIN_REFRESH_INTERVAL_MS: u64 = 100;

/// Typed configuration keys accepted by `--set key=value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Backend base URL (`backend.base_url`).
    BackendBaseUrl,
    /// Per-request timeout (`backend.request_timeout_ms`).
    BackendRequestTimeoutMs,
    /// Refresh period (`refresh.interval_ms`).
    RefreshIntervalMs,
    /// Overlapping-cycle policy (`refresh.overlap`).
    RefreshOverlap,
    /// Primary batch failure policy (`refresh.primary_batch`).
    RefreshPrimaryBatch,
    /// Fallback metrics-store URL (`links.prometheus_fallback`).
    LinksPrometheusFallback,
    /// Grafana URL (`links.grafana_url`).
    LinksGrafanaUrl,
    /// Log level (`logging.level`).
    LoggingLevel,
    /// Log output format (`logging.format`).
    LoggingFormat,
}

impl ConfigKey {
    /// Return the dotted config path string for this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::BackendBaseUrl => "backend.base_url",
            ConfigKey::BackendRequestTimeoutMs => "backend.request_timeout_ms",
            ConfigKey::RefreshIntervalMs => "refresh.interval_ms",
            ConfigKey::RefreshOverlap => "refresh.overlap",
            ConfigKey::RefreshPrimaryBatch => "refresh.primary_batch",
            ConfigKey::LinksPrometheusFallback => "links.prometheus_fallback",
            ConfigKey::LinksGrafanaUrl => "links.grafana_url",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingFormat => "logging.format",
        }
    }

    /// Parse a dotted config path string into a `ConfigKey`, if valid.
    pub fn parse_str(path: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == path)
    }

    /// All keys, in documentation order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::BackendBaseUrl,
            ConfigKey::BackendRequestTimeoutMs,
            ConfigKey::RefreshIntervalMs,
            ConfigKey::RefreshOverlap,
            ConfigKey::RefreshPrimaryBatch,
            ConfigKey::LinksPrometheusFallback,
            ConfigKey::LinksGrafanaUrl,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingFormat,
        ]
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings
    pub backend: BackendConfig,

    /// Refresh loop settings
    pub refresh: RefreshConfig,

    /// External links shown in the header
    pub links: LinksConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DashboardError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::parse_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| DashboardError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DashboardError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_http_url("backend.base_url", &self.backend.base_url)?;
        validate_http_url("links.prometheus_fallback", &self.links.prometheus_fallback)?;
        validate_http_url("links.grafana_url", &self.links.grafana_url)?;

        if self.backend.request_timeout_ms == 0 {
            return Err(DashboardError::Config(
                "Request timeout cannot be 0".to_string(),
            ));
        }

        if self.refresh.interval_ms < MIN_REFRESH_INTERVAL_MS {
            return Err(DashboardError::Config(format!(
                "Refresh interval must be at least {}ms",
                MIN_REFRESH_INTERVAL_MS
            )));
        }

        Ok(())
    }

    /// Apply a single `key=value` override.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::BackendBaseUrl => {
                self.backend.base_url = value.trim_end_matches('/').to_string();
            }
            ConfigKey::BackendRequestTimeoutMs => {
                self.backend.request_timeout_ms = parse_u64(key, value)?;
            }
            ConfigKey::RefreshIntervalMs => {
                self.refresh.interval_ms = parse_u64(key, value)?;
            }
            ConfigKey::RefreshOverlap => {
                self.refresh.overlap = match value {
                    "cancel-previous" => OverlapPolicy::CancelPrevious,
                    "concurrent" => OverlapPolicy::Concurrent,
                    _ => {
                        return Err(DashboardError::Config(format!(
                            "Invalid refresh.overlap: {}. Expected: cancel-previous, concurrent",
                            value
                        )));
                    }
                };
            }
            ConfigKey::RefreshPrimaryBatch => {
                self.refresh.primary_batch = match value {
                    "isolated" => PrimaryBatchPolicy::Isolated,
                    "all-or-nothing" => PrimaryBatchPolicy::AllOrNothing,
                    _ => {
                        return Err(DashboardError::Config(format!(
                            "Invalid refresh.primary_batch: {}. Expected: isolated, all-or-nothing",
                            value
                        )));
                    }
                };
            }
            ConfigKey::LinksPrometheusFallback => {
                self.links.prometheus_fallback = value.trim_end_matches('/').to_string();
            }
            ConfigKey::LinksGrafanaUrl => {
                self.links.grafana_url = value.to_string();
            }
            ConfigKey::LoggingLevel => {
                self.logging.level = value.to_string();
            }
            ConfigKey::LoggingFormat => {
                self.logging.format = match value {
                    "json" => LogFormat::Json,
                    "pretty" | "text" => LogFormat::Pretty,
                    _ => {
                        return Err(DashboardError::Config(format!(
                            "Invalid logging format: {}. Expected: json, pretty",
                            value
                        )));
                    }
                };
            }
        }
        Ok(())
    }

    /// Parse and apply a raw `key=value` override string.
    pub fn apply_override(&mut self, raw: &str) -> Result<()> {
        let (key, value) = raw.split_once('=').ok_or_else(|| {
            DashboardError::Config(format!(
                "Invalid config override '{}': expected key=value format",
                raw
            ))
        })?;
        let key = ConfigKey::parse_str(key.trim())
            .ok_or_else(|| DashboardError::Config(format!("Unknown config key: {}", key)))?;
        self.set(key, value.trim())
    }
}

fn parse_u64(key: ConfigKey, value: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        DashboardError::Config(format!("Invalid {} value: {}", key.as_str(), value))
    })
}

fn validate_http_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(DashboardError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )))
    }
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the demo-ui backend, without trailing slash
    pub base_url: String,

    /// Per-fetch timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_ms: 5000,
        }
    }
}

impl BackendConfig {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Refresh loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Fixed wall-clock period between cycle starts
    pub interval_ms: u64,

    /// What to do when a cycle is still running at the next tick
    pub overlap: OverlapPolicy,

    /// How failures inside the status/faults/benchmark batch propagate
    pub primary_batch: PrimaryBatchPolicy,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            overlap: OverlapPolicy::default(),
            primary_batch: PrimaryBatchPolicy::default(),
        }
    }
}

impl RefreshConfig {
    /// Refresh period as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Policy for a refresh tick that fires while the previous cycle is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Abort the in-flight cycle before starting the next one
    #[default]
    CancelPrevious,

    /// Let cycles overlap; older results never replace newer ones
    Concurrent,
}

/// Failure policy for the status / faults / benchmark batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryBatchPolicy {
    /// Each source fails on its own
    #[default]
    Isolated,

    /// Any failing source fails all three panels with one message
    AllOrNothing,
}

/// External links shown in the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Used when `/api/demo/config` is unreachable or incomplete
    pub prometheus_fallback: String,

    /// Grafana URL
    pub grafana_url: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            prometheus_fallback: DEFAULT_PROMETHEUS_URL.to_string(),
            grafana_url: DEFAULT_GRAFANA_URL.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, json)
    pub format: LogFormat,

    /// Log file path. The TUI owns the terminal, so without a file the
    /// interactive dashboard does not log at all.
    pub file: Option<std::path::PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,

    /// JSON format
    Json,
}
