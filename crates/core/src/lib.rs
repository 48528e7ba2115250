// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! adbx-core: shared types for the adbx connection coordinator
//!
//! This crate provides:
//! - The closed set of commands a connection understands, split by whether they
//!   produce a stream
//! - A strict FIFO command queue
//! - The pure lock state machine that guards a connection while a stream is live
//! - Clock and id abstractions so the above can be tested deterministically
//! - Error types shared by every layer

pub mod clock;
pub mod command;
pub mod error;
pub mod id;
pub mod lock;
pub mod queue;

pub use clock::{Clock, FakeClock, SystemClock};
pub use command::{ObjectDepth, ObjectsFilter, Reply, SimpleCommand, StreamCommand};
pub use error::{DriverError, MisuseError};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use lock::{HolderId, LeaseId, Lock, LockConfig, LockEvent, LockInput, LockState};
pub use queue::CommandQueue;
