// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake registry for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DatabaseRegistry, RegistryError};
use crate::driver::{Driver, FakeDatabase, FakeDriver};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Registry over a [`FakeDriver`] that accepts or rejects every attachment
#[derive(Clone)]
pub struct FakeRegistry {
    driver: FakeDriver,
    database: Arc<Mutex<Option<FakeDatabase>>>,
    rejection: Option<RegistryError>,
    attached: Arc<Mutex<Vec<u64>>>,
}

impl FakeRegistry {
    /// Registry whose database is created and initialized up front
    pub fn accepting(driver: &FakeDriver) -> Self {
        let database = driver.database_new().and_then(|mut database| {
            driver.database_init(&mut database)?;
            Ok(database)
        });
        Self {
            driver: driver.clone(),
            database: Arc::new(Mutex::new(database.ok())),
            rejection: None,
            attached: Arc::default(),
        }
    }

    /// Registry that refuses every connection with `error`
    pub fn rejecting(driver: &FakeDriver, error: RegistryError) -> Self {
        Self {
            rejection: Some(error),
            ..Self::accepting(driver)
        }
    }

    /// Ids of connections attached so far
    pub fn attached(&self) -> Vec<u64> {
        self.attached
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl DatabaseRegistry<FakeDriver> for FakeRegistry {
    async fn attach_connection(
        &self,
        connection: &mut <FakeDriver as Driver>::Connection,
    ) -> Result<(), RegistryError> {
        if let Some(error) = &self.rejection {
            return Err(error.clone());
        }

        {
            let mut database = self.database.lock().unwrap_or_else(|e| e.into_inner());
            let database = database
                .as_mut()
                .ok_or_else(|| RegistryError::Rejected("database failed to open".to_string()))?;
            self.driver.connection_init(connection, database)?;
        }

        self.attached
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(connection.id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
