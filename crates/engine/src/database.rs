// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver-level database object and the registry connections attach through

use crate::error::DatabaseError;
use adbx_adapters::{DatabaseRegistry, Driver, RegistryError};
use adbx_core::{DriverError, MisuseError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct DatabaseState<H> {
    /// `None` once released
    handle: Option<H>,
    initialized: bool,
}

/// A native database object shared by the connections attached to it
///
/// Options are set before [`Database::init`]; connections can only attach to
/// an initialized database. The handle is released exactly once, either by
/// [`Database::release`] or when the value is dropped.
pub struct Database<D: Driver> {
    driver: Arc<D>,
    state: Mutex<DatabaseState<D::Database>>,
}

impl<D: Driver> Database<D> {
    pub fn new(driver: Arc<D>) -> Result<Self, DriverError> {
        let handle = driver.database_new()?;
        debug!("database created");
        Ok(Self {
            driver,
            state: Mutex::new(DatabaseState {
                handle: Some(handle),
                initialized: false,
            }),
        })
    }

    pub async fn set_option(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().await;
        let handle = state
            .handle
            .as_mut()
            .ok_or(MisuseError::DatabaseReleased)?;
        self.driver.database_set_option(handle, key, value)?;
        debug!(key, "database option set");
        Ok(())
    }

    pub async fn init(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().await;
        let handle = state
            .handle
            .as_mut()
            .ok_or(MisuseError::DatabaseReleased)?;
        self.driver.database_init(handle)?;
        state.initialized = true;
        info!("database initialized");
        Ok(())
    }

    /// Release the native database; a second call is a misuse
    pub async fn release(&self) -> Result<(), DatabaseError> {
        let mut state = self.state.lock().await;
        let mut handle = state.handle.take().ok_or(MisuseError::DatabaseReleased)?;
        if let Err(e) = self.driver.database_release(&mut handle) {
            state.handle = Some(handle);
            return Err(e.into());
        }
        state.initialized = false;
        info!("database released");
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.initialized
    }

    pub async fn is_released(&self) -> bool {
        self.state.lock().await.handle.is_none()
    }
}

#[async_trait]
impl<D: Driver> DatabaseRegistry<D> for Database<D> {
    async fn attach_connection(&self, connection: &mut D::Connection) -> Result<(), RegistryError> {
        let mut state = self.state.lock().await;
        let initialized = state.initialized;
        let handle = state
            .handle
            .as_mut()
            .ok_or(MisuseError::DatabaseReleased)?;
        if !initialized {
            return Err(MisuseError::DatabaseNotInitialized.into());
        }
        self.driver.connection_init(connection, handle)?;
        Ok(())
    }
}

impl<D: Driver> Drop for Database<D> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.state.get_mut().handle.take() {
            if let Err(e) = self.driver.database_release(&mut handle) {
                warn!(error = %e, "failed to release database on drop");
            }
        }
    }
}

#[cfg(test)]
#[path = "database_tests.rs"]
mod tests;
