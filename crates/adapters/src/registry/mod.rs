// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database registry boundary
//!
//! A registry owns driver-level database objects. A new connection is only
//! served once the registry has attached it to its database.

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRegistry;

use crate::driver::Driver;
use adbx_core::{DriverError, MisuseError};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from attaching a connection
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
    #[error("attachment rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Misuse(#[from] MisuseError),
}

/// Approves and attaches new connections to a database
#[async_trait]
pub trait DatabaseRegistry<D: Driver>: Send + Sync + 'static {
    /// Bind `connection` to the registry's database
    async fn attach_connection(&self, connection: &mut D::Connection) -> Result<(), RegistryError>;
}
