// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::Driver;
use adbx_core::{DriverError, ObjectsFilter};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    DatabaseNew {
        database: u64,
    },
    DatabaseSetOption {
        database: u64,
        key: String,
        value: String,
    },
    DatabaseInit {
        database: u64,
    },
    DatabaseRelease {
        database: u64,
    },
    ConnectionNew {
        connection: u64,
    },
    ConnectionSetOption {
        connection: u64,
        key: String,
        value: String,
    },
    ConnectionInit {
        connection: u64,
        database: u64,
    },
    ConnectionRelease {
        connection: u64,
    },
    GetInfo {
        connection: u64,
        codes: Vec<u32>,
    },
    GetObjects {
        connection: u64,
        filter: ObjectsFilter,
    },
    GetTableTypes {
        connection: u64,
    },
    GetTableSchema {
        connection: u64,
        table: String,
    },
    Commit {
        connection: u64,
    },
    Rollback {
        connection: u64,
    },
}

impl DriverCall {
    /// Operation name, as used by [`FakeDriver::fail_next`]
    pub fn name(&self) -> &'static str {
        match self {
            DriverCall::DatabaseNew { .. } => "database_new",
            DriverCall::DatabaseSetOption { .. } => "database_set_option",
            DriverCall::DatabaseInit { .. } => "database_init",
            DriverCall::DatabaseRelease { .. } => "database_release",
            DriverCall::ConnectionNew { .. } => "connection_new",
            DriverCall::ConnectionSetOption { .. } => "connection_set_option",
            DriverCall::ConnectionInit { .. } => "connection_init",
            DriverCall::ConnectionRelease { .. } => "connection_release",
            DriverCall::GetInfo { .. } => "get_info",
            DriverCall::GetObjects { .. } => "get_objects",
            DriverCall::GetTableTypes { .. } => "get_table_types",
            DriverCall::GetTableSchema { .. } => "get_table_schema",
            DriverCall::Commit { .. } => "commit",
            DriverCall::Rollback { .. } => "rollback",
        }
    }

    /// Connection the call acted on, if any
    pub fn connection(&self) -> Option<u64> {
        match self {
            DriverCall::DatabaseNew { .. }
            | DriverCall::DatabaseSetOption { .. }
            | DriverCall::DatabaseInit { .. }
            | DriverCall::DatabaseRelease { .. } => None,
            DriverCall::ConnectionNew { connection }
            | DriverCall::ConnectionSetOption { connection, .. }
            | DriverCall::ConnectionInit { connection, .. }
            | DriverCall::ConnectionRelease { connection }
            | DriverCall::GetInfo { connection, .. }
            | DriverCall::GetObjects { connection, .. }
            | DriverCall::GetTableTypes { connection }
            | DriverCall::GetTableSchema { connection, .. }
            | DriverCall::Commit { connection }
            | DriverCall::Rollback { connection } => Some(*connection),
        }
    }
}

/// Fake driver-level database
#[derive(Debug, Clone)]
pub struct FakeDatabase {
    pub id: u64,
    pub options: Vec<(String, String)>,
    pub initialized: bool,
    pub released: bool,
}

/// Fake native connection
#[derive(Debug, Clone)]
pub struct FakeConnection {
    pub id: u64,
    pub options: Vec<(String, String)>,
    pub database: Option<u64>,
    pub released: bool,
}

/// Fake result stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeStream {
    pub connection: u64,
    pub command: &'static str,
    pub rows: Vec<String>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<DriverCall>,
    failures: HashMap<&'static str, VecDeque<DriverError>>,
    tables: HashMap<String, String>,
    table_types: Vec<String>,
    next_id: u64,
    call_delay: Duration,
}

/// Fake driver for testing
///
/// Records every call, can be told to fail specific operations, and tracks
/// how many calls were ever in flight at once.
#[derive(Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter when a call returns
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.lock().table_types = vec!["TABLE".to_string(), "VIEW".to_string()];
        driver
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a table and the schema `get_table_schema` reports for it
    pub fn with_table(self, table: impl Into<String>, schema: impl Into<String>) -> Self {
        self.lock().tables.insert(table.into(), schema.into());
        self
    }

    /// Make every call block for `delay` before returning
    pub fn with_call_delay(self, delay: Duration) -> Self {
        self.lock().call_delay = delay;
        self
    }

    /// Fail the next call of operation `op` (see [`DriverCall::name`])
    pub fn fail_next(&self, op: &'static str, error: DriverError) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Names of all recorded calls, in order
    pub fn call_names(&self) -> Vec<&'static str> {
        self.lock().calls.iter().map(DriverCall::name).collect()
    }

    /// Number of recorded calls of operation `op`
    pub fn count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.name() == op).count()
    }

    /// Highest number of calls that were ever executing at the same time
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> u64 {
        let mut state = self.lock();
        state.next_id += 1;
        state.next_id
    }

    /// Record a call, honor the configured delay, and pop an injected failure
    fn record(&self, call: DriverCall) -> Result<(), DriverError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (delay, failure) = {
            let mut state = self.lock();
            let failure = state
                .failures
                .get_mut(call.name())
                .and_then(VecDeque::pop_front);
            state.calls.push(call);
            (state.call_delay, failure)
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn usable(connection: &FakeConnection) -> Result<(), DriverError> {
        if connection.released {
            return Err(DriverError::new("connection has been released").with_sql_state("08003"));
        }
        if connection.database.is_none() {
            return Err(DriverError::new("connection is not initialized").with_sql_state("08003"));
        }
        Ok(())
    }
}

impl Driver for FakeDriver {
    type Database = FakeDatabase;
    type Connection = FakeConnection;
    type Stream = FakeStream;
    type Schema = String;

    fn database_new(&self) -> Result<FakeDatabase, DriverError> {
        let id = self.next_id();
        self.record(DriverCall::DatabaseNew { database: id })?;
        Ok(FakeDatabase {
            id,
            options: Vec::new(),
            initialized: false,
            released: false,
        })
    }

    fn database_set_option(
        &self,
        database: &mut FakeDatabase,
        key: &str,
        value: &str,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::DatabaseSetOption {
            database: database.id,
            key: key.to_string(),
            value: value.to_string(),
        })?;
        database.options.push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn database_init(&self, database: &mut FakeDatabase) -> Result<(), DriverError> {
        self.record(DriverCall::DatabaseInit {
            database: database.id,
        })?;
        database.initialized = true;
        Ok(())
    }

    fn database_release(&self, database: &mut FakeDatabase) -> Result<(), DriverError> {
        self.record(DriverCall::DatabaseRelease {
            database: database.id,
        })?;
        if database.released {
            return Err(DriverError::new("database already released").with_sql_state("HY024"));
        }
        database.released = true;
        Ok(())
    }

    fn connection_new(&self) -> Result<FakeConnection, DriverError> {
        let id = self.next_id();
        self.record(DriverCall::ConnectionNew { connection: id })?;
        Ok(FakeConnection {
            id,
            options: Vec::new(),
            database: None,
            released: false,
        })
    }

    fn connection_set_option(
        &self,
        connection: &mut FakeConnection,
        key: &str,
        value: &str,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::ConnectionSetOption {
            connection: connection.id,
            key: key.to_string(),
            value: value.to_string(),
        })?;
        if connection.released {
            return Err(DriverError::new("connection has been released").with_sql_state("08003"));
        }
        connection.options.push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn connection_init(
        &self,
        connection: &mut FakeConnection,
        database: &mut FakeDatabase,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::ConnectionInit {
            connection: connection.id,
            database: database.id,
        })?;
        if !database.initialized || database.released {
            return Err(DriverError::new("database is not usable").with_sql_state("08001"));
        }
        connection.database = Some(database.id);
        Ok(())
    }

    fn connection_release(&self, connection: &mut FakeConnection) -> Result<(), DriverError> {
        self.record(DriverCall::ConnectionRelease {
            connection: connection.id,
        })?;
        if connection.released {
            return Err(DriverError::new("connection already released").with_sql_state("HY024"));
        }
        connection.released = true;
        Ok(())
    }

    fn get_info(
        &self,
        connection: &mut FakeConnection,
        codes: &[u32],
    ) -> Result<FakeStream, DriverError> {
        self.record(DriverCall::GetInfo {
            connection: connection.id,
            codes: codes.to_vec(),
        })?;
        Self::usable(connection)?;
        Ok(FakeStream {
            connection: connection.id,
            command: "get_info",
            rows: codes.iter().map(|code| format!("info:{}", code)).collect(),
        })
    }

    fn get_objects(
        &self,
        connection: &mut FakeConnection,
        filter: &ObjectsFilter,
    ) -> Result<FakeStream, DriverError> {
        self.record(DriverCall::GetObjects {
            connection: connection.id,
            filter: filter.clone(),
        })?;
        Self::usable(connection)?;
        let mut rows: Vec<String> = self
            .lock()
            .tables
            .keys()
            .filter(|table| {
                filter
                    .table_name
                    .as_deref()
                    .map_or(true, |wanted| wanted == table.as_str())
            })
            .cloned()
            .collect();
        rows.sort();
        Ok(FakeStream {
            connection: connection.id,
            command: "get_objects",
            rows,
        })
    }

    fn get_table_types(&self, connection: &mut FakeConnection) -> Result<FakeStream, DriverError> {
        self.record(DriverCall::GetTableTypes {
            connection: connection.id,
        })?;
        Self::usable(connection)?;
        Ok(FakeStream {
            connection: connection.id,
            command: "get_table_types",
            rows: self.lock().table_types.clone(),
        })
    }

    fn get_table_schema(
        &self,
        connection: &mut FakeConnection,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        table: &str,
    ) -> Result<String, DriverError> {
        self.record(DriverCall::GetTableSchema {
            connection: connection.id,
            table: table.to_string(),
        })?;
        Self::usable(connection)?;
        self.lock().tables.get(table).cloned().ok_or_else(|| {
            DriverError::new(format!("table not found: {}", table))
                .with_vendor_code(1)
                .with_sql_state("42S02")
        })
    }

    fn commit(&self, connection: &mut FakeConnection) -> Result<(), DriverError> {
        self.record(DriverCall::Commit {
            connection: connection.id,
        })?;
        Self::usable(connection)
    }

    fn rollback(&self, connection: &mut FakeConnection) -> Result<(), DriverError> {
        self.record(DriverCall::Rollback {
            connection: connection.id,
        })?;
        Self::usable(connection)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
