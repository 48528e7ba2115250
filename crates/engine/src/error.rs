// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for connections and databases

use crate::config::ConfigError;
use crate::lease::UnlockToken;
use adbx_adapters::RegistryError;
use adbx_core::{DriverError, MisuseError};
use std::time::Duration;
use thiserror::Error;

/// Why a connection never started serving
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("could not create native connection: {0}")]
    Create(#[source] DriverError),
    #[error("could not set connection option {key}: {source}")]
    SetOption {
        key: String,
        #[source]
        source: DriverError,
    },
    #[error("database registry refused the connection: {0}")]
    Attach(#[source] RegistryError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors returned by [`crate::Connection`] operations
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
    #[error("initialization failed: {0}")]
    Initialization(#[from] InitializationError),
    #[error("misuse: {0}")]
    Misuse(#[from] MisuseError),
    /// A release was refused; the token is handed back still live
    #[error("release rejected: {reason}")]
    TokenRejected {
        #[source]
        reason: MisuseError,
        token: UnlockToken,
    },
    #[error("connection coordinator has stopped")]
    Closed,
    #[error("{command} timed out after {after:?}")]
    Timeout {
        command: &'static str,
        after: Duration,
    },
    #[error("{command} produced an unexpected reply")]
    UnexpectedReply { command: &'static str },
}

impl ConnectionError {
    /// A logic error in the calling code rather than a runtime condition
    pub fn is_misuse(&self) -> bool {
        self.misuse().is_some()
    }

    pub fn misuse(&self) -> Option<&MisuseError> {
        match self {
            ConnectionError::Misuse(reason) | ConnectionError::TokenRejected { reason, .. } => {
                Some(reason)
            }
            _ => None,
        }
    }

    /// Take back the token of a rejected release.
    ///
    /// Dropping it instead counts as its holder going away, which unlocks the
    /// connection it belongs to.
    pub fn into_rejected_token(self) -> Option<UnlockToken> {
        match self {
            ConnectionError::TokenRejected { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_driver(&self) -> bool {
        matches!(self, ConnectionError::Driver(_))
    }

    pub fn is_initialization(&self) -> bool {
        matches!(self, ConnectionError::Initialization(_))
    }
}

/// Errors returned by [`crate::Database`] operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
    #[error("misuse: {0}")]
    Misuse(#[from] MisuseError),
}
