//! Backend access.
//!
//! The orchestrator only needs "GET this path, give me JSON". [`Backend`] is
//! that seam; [`HttpBackend`] talks to the real demo-ui service over HTTP and
//! [`TimeoutBackend`] puts a deadline on any other backend. Unit tests use an
//! in-memory backend with scripted replies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Source of raw JSON payloads, addressed by backend path.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch `path` (e.g. `/api/status`) and decode the body as JSON.
    ///
    /// Non-2xx responses, transport failures and non-JSON bodies are errors.
    async fn get_json(&self, path: &str) -> Result<Value>;

    /// Human-readable location of this backend, for logs and the status bar.
    fn describe(&self) -> String;
}

/// HTTP backend for the demo-ui service.
pub struct HttpBackend {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("HTTP client error: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                DashboardError::Timeout {
                    path: path.to_string(),
                    after: self.timeout,
                }
            } else {
                DashboardError::Transport {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::HttpStatus {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| DashboardError::Transport {
            path: path.to_string(),
            message: format!("failed to read body: {e}"),
        })?;

        serde_json::from_slice(&body).map_err(|e| DashboardError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

/// Wraps another backend and bounds every request by a deadline.
///
/// Applies to backends without a timeout of their own.
pub struct TimeoutBackend {
    inner: Arc<dyn Backend>,
    timeout: Duration,
}

impl TimeoutBackend {
    pub fn new(inner: Arc<dyn Backend>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl Backend for TimeoutBackend {
    async fn get_json(&self, path: &str) -> Result<Value> {
        match tokio::time::timeout(self.timeout, self.inner.get_json(path)).await {
            Ok(result) => result,
            Err(_) => Err(DashboardError::Timeout {
                path: path.to_string(),
                after: self.timeout,
            }),
        }
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

#[cfg(test)]
pub(crate) use scripted::{CannedResponse, StaticBackend};
