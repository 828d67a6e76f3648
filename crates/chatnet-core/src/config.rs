//! Construction-time configuration of the networking stack

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NetworkError, Result};
use crate::http::logging::{LogLevel, LoggingInterceptor};
use crate::http::retry::RetryConfig;
use crate::http::transport::TransportConfig;

/// Settings shared by every request a manager executes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL relative request paths are appended to
    pub base_url: Option<String>,
    /// Headers merged under every request's own headers
    pub default_headers: HashMap<String, String>,
    pub retry: RetryConfig,
    /// Verbosity of the logging interceptor, `none` disables it
    pub log_level: LogLevel,
}

impl NetworkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| NetworkError::DecodingFailed(e.to_string()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Check the base URL and the retry policy
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            let url = Url::parse(base_url)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(NetworkError::InvalidUrl);
            }
        }
        self.retry.validate().map_err(NetworkError::Unknown)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.base_url.clone(),
            default_headers: self.default_headers.clone(),
        }
    }

    /// Logging interceptor for `log_level`, `None` when logging is off
    pub fn logging_interceptor(&self) -> Option<LoggingInterceptor> {
        (self.log_level != LogLevel::None).then(|| LoggingInterceptor::new(self.log_level))
    }
}
