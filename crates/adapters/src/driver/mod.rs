// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Native driver boundary
//!
//! Every call is synchronous and takes the native object it acts on by
//! exclusive reference. Nothing here serializes access: a driver connection is
//! not reentrant, and keeping calls on it one at a time is the coordinator's job.

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DriverCall, FakeConnection, FakeDatabase, FakeDriver, FakeStream};

use adbx_core::{DriverError, ObjectsFilter};

/// A native database driver
pub trait Driver: Send + Sync + 'static {
    /// Driver-level database object
    type Database: Send + 'static;
    /// Native connection handle
    type Connection: Send + 'static;
    /// Result stream returned by metadata calls; keeps the connection busy
    type Stream: Send + 'static;
    /// Table schema representation
    type Schema: Send + 'static;

    fn database_new(&self) -> Result<Self::Database, DriverError>;

    fn database_set_option(
        &self,
        database: &mut Self::Database,
        key: &str,
        value: &str,
    ) -> Result<(), DriverError>;

    fn database_init(&self, database: &mut Self::Database) -> Result<(), DriverError>;

    fn database_release(&self, database: &mut Self::Database) -> Result<(), DriverError>;

    fn connection_new(&self) -> Result<Self::Connection, DriverError>;

    fn connection_set_option(
        &self,
        connection: &mut Self::Connection,
        key: &str,
        value: &str,
    ) -> Result<(), DriverError>;

    /// Bind a connection to an initialized database
    fn connection_init(
        &self,
        connection: &mut Self::Connection,
        database: &mut Self::Database,
    ) -> Result<(), DriverError>;

    /// Fails with an argument error if the handle was already released
    fn connection_release(&self, connection: &mut Self::Connection) -> Result<(), DriverError>;

    fn get_info(
        &self,
        connection: &mut Self::Connection,
        codes: &[u32],
    ) -> Result<Self::Stream, DriverError>;

    fn get_objects(
        &self,
        connection: &mut Self::Connection,
        filter: &ObjectsFilter,
    ) -> Result<Self::Stream, DriverError>;

    fn get_table_types(&self, connection: &mut Self::Connection)
        -> Result<Self::Stream, DriverError>;

    fn get_table_schema(
        &self,
        connection: &mut Self::Connection,
        catalog: Option<&str>,
        db_schema: Option<&str>,
        table: &str,
    ) -> Result<Self::Schema, DriverError>;

    fn commit(&self, connection: &mut Self::Connection) -> Result<(), DriverError>;

    fn rollback(&self, connection: &mut Self::Connection) -> Result<(), DriverError>;
}
