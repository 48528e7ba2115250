// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced driver wrapper for consistent observability

use crate::driver::Driver;
use adbx_core::{DriverError, ObjectsFilter};
use std::time::Instant;

/// Wrapper that adds tracing to any Driver
///
/// Each native call runs inside an `info_span!` named after the operation and
/// logs its duration; failures are logged with the driver's error fields.
#[derive(Clone)]
pub struct TracedDriver<D> {
    inner: D,
}

impl<D> TracedDriver<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

/// Log the outcome of a call that started at `start`
fn finish<T>(start: Instant, result: Result<T, DriverError>) -> Result<T, DriverError> {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => tracing::debug!(elapsed_ms, "ok"),
        Err(e) => tracing::error!(
            elapsed_ms,
            vendor_code = e.vendor_code,
            sql_state = %e.sql_state,
            error = %e.message,
            "driver call failed"
        ),
    }
    result
}

impl<D: Driver> Driver for TracedDriver<D> {
    type Database = D::Database;
    type Connection = D::Connection;
    type Stream = D::Stream;
    type Schema = D::Schema;

    fn database_new(&self) -> Result<Self::Database, DriverError> {
        let _guard = tracing::info_span!("driver.database_new").entered();
        finish(Instant::now(), self.inner.database_new())
    }

    fn database_set_option(
        &self,
        database: &mut Self::Database,
        key: &str,
        value: &str,
    ) -> Result<(), DriverError> {
        // values may hold credentials; only the key is logged
        let _guard = tracing::info_span!("driver.database_set_option", key).entered();
        finish(
            Instant::now(),
            self.inner.database_set_option(database, key, value),
        )
    }

    fn database_init(&self, database: &mut Self::Database) -> Result<(), DriverError> {
        let _guard = tracing::info_span!("driver.database_init").entered();
        tracing::info!("initializing database");
        finish(Instant::now(), self.inner.database_init(database))
    }

    fn database_release(&self, database: &mut Self::Database) -> Result<(), DriverError> {
        let _guard = tracing::info_span!("driver.database_release").entered();
        finish(Instant::now(), self.inner.database_release(database))
    }

    fn connection_new(&self) -> Result<Self::Connection, DriverError> {
        let _guard = tracing::info_span!("driver.connection_new").entered();
        finish(Instant::now(), self.inner.connection_new())
    }

    fn connection_set_option(
        &self,
        connection: &mut Self::Connection,
        key: &str,
        value: &str,
    ) -> Result<(), DriverError> {
        let _guard = tracing::info_span!("driver.connection_set_option", key).entered();
        finish(
            Instant::now(),
            self.inner.connection_set_option(connection, key, value),
        )
    }

    fn connection_init(
        &self,
        connection: &mut Self::Connection,
        database: &mut Self::Database,
    ) -> Result<(), DriverError> {
        let _guard = tracing::info_span!("driver.connection_init").entered();
        tracing::info!("attaching connection");
        finish(Instant::now(), self.inner.connection_init(connection, database))
    }

    fn connection_release(&self, connection: &mut Self::Connection) -> Result<(), DriverError> {
        let _guard = tracing::info_span!("driver.connection_release").entered();
        let result = finish(Instant::now(), self.inner.connection_release(connection));
        if result.is_ok() {
            tracing::info!("connection released");
        }
        result
    }

    fn get_info(
        &self,
        connection: &mut Self::Connection,
        codes: &[u32],
    ) -> Result<Self::Stream, DriverError> {
        let _guard = tracing::info_span!("driver.get_info", codes = codes.len()).entered();
        finish(Instant::now(), self.inner.get_info(connection, codes))
    }

    fn get_objects(
        &self,
        connection: &mut Self::Connection,
        filter: &ObjectsFilter,
    ) -> Result<Self::Stream, DriverError> {
        let _guard = tracing::info_span!(
            "driver.get_objects",
            depth = ?filter.depth,
            table = filter.table_name.as_deref()
        )
        .entered();
        finish(Instant::now(), self.inner.get_objects(connection, filter))
    }

    fn get_table_types(
        &self,
        connection: &mut Self::Connection,
    ) -> Result<Self::Stream, DriverError> {
        let _guard = tracing::info_span!("driver.get_table_types").entered();
        finish(Instant::now(), self.inner.get_table_types(connection))
    }

    fn get_table_schema(
        &self,
        connection: &mut Self::Connection,
        catalog: Option<&str>,
        db_schema: Option<&str>,
        table: &str,
    ) -> Result<Self::Schema, DriverError> {
        let _guard = tracing::info_span!("driver.get_table_schema", catalog, db_schema, table)
            .entered();
        finish(
            Instant::now(),
            self.inner
                .get_table_schema(connection, catalog, db_schema, table),
        )
    }

    fn commit(&self, connection: &mut Self::Connection) -> Result<(), DriverError> {
        let _guard = tracing::info_span!("driver.commit").entered();
        finish(Instant::now(), self.inner.commit(connection))
    }

    fn rollback(&self, connection: &mut Self::Connection) -> Result<(), DriverError> {
        let _guard = tracing::info_span!("driver.rollback").entered();
        finish(Instant::now(), self.inner.rollback(connection))
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
