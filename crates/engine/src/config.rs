// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

/// A native connection option, applied in order before attachment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOption {
    pub key: String,
    pub value: String,
}

/// Per-connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Label used in logs and lock events
    pub name: String,
    pub options: Vec<ConnectionOption>,
    /// Requests that can wait in the coordinator's mailbox before senders block
    pub mailbox_capacity: usize,
    /// Warn once a stream lease has been held this long
    #[serde(with = "humantime_serde")]
    pub stale_after: Option<Duration>,
    /// How often a held lease is checked against `stale_after`
    #[serde(with = "humantime_serde")]
    pub stale_check_interval: Duration,
    /// Caller-side deadline for a reply; `None` waits indefinitely
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            name: "connection".to_string(),
            options: Vec::new(),
            mailbox_capacity: 64,
            stale_after: None,
            stale_check_interval: Duration::from_secs(1),
            request_timeout: None,
        }
    }
}

impl ConnectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(ConnectionOption {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    pub fn with_stale_check_interval(mut self, interval: Duration) -> Self {
        self.stale_check_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid(
                "mailbox_capacity must be at least 1".to_string(),
            ));
        }
        if self.stale_check_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "stale_check_interval must be non-zero".to_string(),
            ));
        }
        if let Some(option) = self.options.iter().find(|o| o.key.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "connection option with value {:?} has an empty key",
                option.value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
