// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors shared across the driver boundary and the coordinator

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// SQLSTATE reported when a driver gives none
pub const UNKNOWN_SQL_STATE: &str = "HY000";

/// A native driver call failed
///
/// Always local to the request that triggered it.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} (vendor code {vendor_code}, sqlstate {sql_state})")]
pub struct DriverError {
    pub message: String,
    pub vendor_code: i32,
    /// Five character SQLSTATE
    pub sql_state: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            vendor_code: 0,
            sql_state: UNKNOWN_SQL_STATE.to_string(),
        }
    }

    pub fn with_vendor_code(mut self, vendor_code: i32) -> Self {
        self.vendor_code = vendor_code;
        self
    }

    /// Set the SQLSTATE, padded or truncated to five characters
    pub fn with_sql_state(mut self, sql_state: impl AsRef<str>) -> Self {
        let mut state: String = sql_state.as_ref().chars().take(5).collect();
        while state.chars().count() < 5 {
            state.push('0');
        }
        self.sql_state = state;
        self
    }
}

/// A caller used the API in a way that can never succeed
///
/// Kept apart from [`DriverError`] so a logic bug is never mistaken for a
/// runtime or data condition.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MisuseError {
    #[error("connection has already been released")]
    ConnectionReleased,
    #[error("database has already been released")]
    DatabaseReleased,
    #[error("database has not been initialized")]
    DatabaseNotInitialized,
    #[error("unlock token for lease {lease} does not match the current holder")]
    StaleToken { lease: String },
    #[error("unlock token belongs to connection {owner}, not {connection}")]
    ForeignToken { owner: String, connection: String },
}
