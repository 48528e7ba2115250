// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection coordinator
//!
//! The coordinator is the only code that touches the native connection. It
//! runs as a single task fed by one mailbox, so every request, release and
//! liveness signal is handled one at a time. Requests wait in a FIFO queue and
//! are drained only while the lock is free; a successful streaming call locks
//! the connection and stops the drain until its lease ends.

use crate::error::ConnectionError;
use crate::lease::{Lease, UnlockToken};
use adbx_adapters::Driver;
use adbx_core::{
    Clock, CommandQueue, HolderId, IdGen, LeaseId, Lock, LockConfig, LockEvent, LockInput,
    MisuseError, Reply, SimpleCommand, StreamCommand,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

pub(crate) type ReplyTo<T> = oneshot::Sender<Result<T, ConnectionError>>;

/// Work that waits its turn in the queue
pub(crate) enum Request<D: Driver> {
    Submit {
        command: SimpleCommand,
        reply: ReplyTo<Reply<D::Schema>>,
    },
    Acquire {
        command: StreamCommand,
        reply: ReplyTo<Lease<D::Stream>>,
    },
    /// Release the native connection
    Close { reply: ReplyTo<()> },
}

impl<D: Driver> Request<D> {
    fn name(&self) -> &'static str {
        match self {
            Request::Submit { command, .. } => command.name(),
            Request::Acquire { command, .. } => command.name(),
            Request::Close { .. } => "release_connection",
        }
    }
}

/// Everything a caller can send to the coordinator
pub(crate) enum Message<D: Driver> {
    Enqueue(Request<D>),
    /// Handled immediately; never waits behind queued work
    Release {
        token: UnlockToken,
        reply: ReplyTo<()>,
    },
}

struct Queued<D: Driver> {
    seq: u64,
    request: Request<D>,
}

/// Settings the coordinator needs once it is running
pub(crate) struct CoordinatorSettings {
    pub id: String,
    pub lock: LockConfig,
    pub stale_check_interval: Duration,
}

pub(crate) struct Coordinator<D: Driver, C: Clock, I: IdGen> {
    id: String,
    driver: Arc<D>,
    /// `None` once the native connection has been released
    native: Option<D::Connection>,
    queue: CommandQueue<Queued<D>>,
    lock: Lock,
    /// Closes when the current holder's token is dropped
    watch: Option<oneshot::Receiver<()>>,
    mailbox: mpsc::Receiver<Message<D>>,
    stale_check_interval: Duration,
    clock: C,
    ids: I,
}

impl<D, C, I> Coordinator<D, C, I>
where
    D: Driver,
    C: Clock,
    I: IdGen,
{
    pub(crate) fn new(
        driver: Arc<D>,
        native: D::Connection,
        mailbox: mpsc::Receiver<Message<D>>,
        settings: CoordinatorSettings,
        clock: C,
        ids: I,
    ) -> Self {
        Self {
            id: settings.id,
            driver,
            native: Some(native),
            queue: CommandQueue::new(),
            lock: Lock::new(settings.lock),
            watch: None,
            mailbox,
            stale_check_interval: settings.stale_check_interval,
            clock,
            ids,
        }
    }

    /// Serve until every handle is gone, the queue is empty and no lease is live
    pub(crate) async fn run(mut self) {
        info!("coordinator started");
        let mut ticker = tokio::time::interval(self.stale_check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut mailbox_open = true;

        loop {
            if !mailbox_open && self.lock.is_free() && self.queue.is_empty() {
                break;
            }
            let watching_age = !self.lock.is_free() && self.lock.config.stale_after.is_some();

            tokio::select! {
                message = self.mailbox.recv(), if mailbox_open => match message {
                    Some(message) => self.handle_message(message),
                    None => {
                        debug!("all handles dropped");
                        mailbox_open = false;
                    }
                },
                _ = holder_gone(&mut self.watch) => self.handle_holder_gone(),
                _ = ticker.tick(), if watching_age => self.tick(),
            }

            self.drain();
        }

        info!("coordinator stopped");
    }

    fn handle_message(&mut self, message: Message<D>) {
        match message {
            Message::Enqueue(request) => {
                let seq = self.queue.enqueued() + 1;
                debug!(
                    seq,
                    command = request.name(),
                    pending = self.queue.len(),
                    "queued"
                );
                self.queue.push(Queued { seq, request });
            }
            Message::Release { token, reply } => {
                let result = self.release(token);
                let _ = reply.send(result);
            }
        }
    }

    /// End the lease `token` holds.
    ///
    /// A token that is refused goes back to the caller inside the error, still
    /// live, so refusing it never looks like its holder going away.
    fn release(&mut self, token: UnlockToken) -> Result<(), ConnectionError> {
        if token.connection_id() != self.id {
            warn!(owner = token.connection_id(), "release with a foreign token");
            return Err(ConnectionError::TokenRejected {
                reason: MisuseError::ForeignToken {
                    owner: token.connection_id().to_string(),
                    connection: self.id.clone(),
                },
                token,
            });
        }

        let lease = token.lease().clone();
        let (lock, events) = self
            .lock
            .transition(LockInput::Release { lease: lease.clone() }, &self.clock);
        self.lock = lock;

        match events.first() {
            Some(LockEvent::Released {
                holder, held_for, ..
            }) => {
                // token drops with this frame; stop watching first so it is not
                // mistaken for the holder going away
                self.watch = None;
                info!(%holder, %lease, held_ms = held_for.as_millis() as u64, "lock released");
                Ok(())
            }
            _ => {
                warn!(%lease, "release with a stale token");
                Err(ConnectionError::TokenRejected {
                    reason: MisuseError::StaleToken { lease: lease.0 },
                    token,
                })
            }
        }
    }

    fn handle_holder_gone(&mut self) {
        self.watch = None;
        let Some(lease) = self.lock.lease().cloned() else {
            return;
        };
        let (lock, events) = self
            .lock
            .transition(LockInput::HolderGone { lease }, &self.clock);
        self.lock = lock;

        for event in events {
            if let LockEvent::HolderGone {
                holder,
                lease,
                held_for,
                ..
            } = event
            {
                warn!(
                    %holder,
                    %lease,
                    held_ms = held_for.as_millis() as u64,
                    "lock holder went away without releasing, unlocking"
                );
            }
        }
    }

    fn tick(&mut self) {
        let (lock, events) = self.lock.transition(LockInput::Tick, &self.clock);
        self.lock = lock;

        for event in events {
            if let LockEvent::Stale {
                holder,
                lease,
                held_for,
                ..
            } = event
            {
                warn!(
                    %holder,
                    %lease,
                    held_ms = held_for.as_millis() as u64,
                    pending = self.queue.len(),
                    "stream lease held past stale threshold"
                );
            }
        }
    }

    /// Execute queued requests until the queue is empty or a lease locks the connection
    fn drain(&mut self) {
        while self.lock.is_free() {
            let Some(Queued { seq, request }) = self.queue.pop() else {
                break;
            };
            self.execute(seq, request);
        }
    }

    fn execute(&mut self, seq: u64, request: Request<D>) {
        match request {
            Request::Submit { command, reply } => {
                debug!(seq, command = command.name(), "executing");
                let result = self.run_simple(&command);
                if let Err(e) = &result {
                    debug!(seq, command = command.name(), error = %e, "request failed");
                }
                if reply.send(result).is_err() {
                    debug!(seq, command = command.name(), "caller went away before reply");
                }
            }
            Request::Acquire { command, reply } => {
                debug!(seq, command = command.name(), "executing");
                match self.run_stream(&command) {
                    Ok(stream) => self.grant(seq, command.name(), stream, reply),
                    Err(e) => {
                        debug!(seq, command = command.name(), error = %e, "request failed");
                        let _ = reply.send(Err(e));
                    }
                }
            }
            Request::Close { reply } => {
                let _ = reply.send(self.close());
            }
        }
    }

    /// Hand a fresh stream to its caller and lock the connection behind it
    fn grant(
        &mut self,
        seq: u64,
        command: &'static str,
        stream: D::Stream,
        reply: ReplyTo<Lease<D::Stream>>,
    ) {
        let lease = LeaseId::new(self.ids.next());
        let holder = HolderId::new(format!("request-{}", seq));
        let (alive, watch) = oneshot::channel();
        let token = UnlockToken::new(self.id.clone(), lease.clone(), alive);

        // only lock for a caller that is still there to receive the lease
        if reply.send(Ok(Lease::new(stream, token))).is_err() {
            debug!(seq, command, "caller went away before the lease was delivered");
            return;
        }

        let (lock, events) = self.lock.transition(
            LockInput::Acquire {
                holder,
                lease,
                command: command.to_string(),
            },
            &self.clock,
        );
        self.lock = lock;

        match events.first() {
            Some(LockEvent::Acquired { holder, lease, .. }) => {
                self.watch = Some(watch);
                info!(%holder, %lease, command, "lock acquired");
            }
            Some(LockEvent::Denied {
                holder,
                current_holder,
                ..
            }) => {
                error!(
                    %holder,
                    %current_holder,
                    command,
                    "stream handed out while the connection was locked"
                );
            }
            _ => {}
        }
    }

    fn run_simple(&mut self, command: &SimpleCommand) -> Result<Reply<D::Schema>, ConnectionError> {
        let native = self
            .native
            .as_mut()
            .ok_or(MisuseError::ConnectionReleased)?;
        let driver = &self.driver;

        let reply = match command {
            SimpleCommand::GetTableSchema {
                catalog,
                db_schema,
                table,
            } => Reply::Schema(driver.get_table_schema(
                native,
                catalog.as_deref(),
                db_schema.as_deref(),
                table,
            )?),
            SimpleCommand::Commit => {
                driver.commit(native)?;
                Reply::Done
            }
            SimpleCommand::Rollback => {
                driver.rollback(native)?;
                Reply::Done
            }
            SimpleCommand::SetOption { key, value } => {
                driver.connection_set_option(native, key, value)?;
                Reply::Done
            }
        };
        Ok(reply)
    }

    fn run_stream(&mut self, command: &StreamCommand) -> Result<D::Stream, ConnectionError> {
        let native = self
            .native
            .as_mut()
            .ok_or(MisuseError::ConnectionReleased)?;
        let driver = &self.driver;

        let stream = match command {
            StreamCommand::GetInfo { codes } => driver.get_info(native, codes)?,
            StreamCommand::GetObjects(filter) => driver.get_objects(native, filter)?,
            StreamCommand::GetTableTypes => driver.get_table_types(native)?,
        };
        Ok(stream)
    }

    /// Release the native connection; it is never released twice
    fn close(&mut self) -> Result<(), ConnectionError> {
        let mut native = self.native.take().ok_or(MisuseError::ConnectionReleased)?;
        match self.driver.connection_release(&mut native) {
            Ok(()) => {
                info!("native connection released");
                Ok(())
            }
            Err(e) => {
                // the handle is still live as far as the driver is concerned
                self.native = Some(native);
                Err(e.into())
            }
        }
    }
}

impl<D: Driver, C: Clock, I: IdGen> Drop for Coordinator<D, C, I> {
    fn drop(&mut self) {
        if let Some(mut native) = self.native.take() {
            match self.driver.connection_release(&mut native) {
                Ok(()) => info!("native connection released on shutdown"),
                Err(e) => warn!(error = %e, "failed to release native connection on shutdown"),
            }
        }
    }
}

/// Resolves when the watched holder drops its token; pending while nothing is watched
async fn holder_gone(watch: &mut Option<oneshot::Receiver<()>>) {
    match watch {
        Some(alive) => {
            let _ = alive.await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
