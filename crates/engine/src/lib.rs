// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! adbx connection coordinator
//!
//! Each [`Connection`] owns one native driver connection through a dedicated
//! coordinator task. Requests from any number of callers run one at a time in
//! arrival order; a streaming request locks the connection until the caller
//! releases its [`UnlockToken`] or drops it.

mod config;
mod connection;
mod coordinator;
mod database;
mod error;
mod lease;

pub use config::{ConfigError, ConnectionConfig, ConnectionOption};
pub use connection::Connection;
pub use database::Database;
pub use error::{ConnectionError, DatabaseError, InitializationError};
pub use lease::{Lease, UnlockToken};
