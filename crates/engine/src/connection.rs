// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller-facing connection handle

use crate::config::ConnectionConfig;
use crate::coordinator::{Coordinator, CoordinatorSettings, Message, Request};
use crate::error::{ConnectionError, InitializationError};
use crate::lease::{Lease, UnlockToken};
use adbx_adapters::{DatabaseRegistry, Driver};
use adbx_core::{
    Clock, IdGen, LockConfig, MisuseError, ObjectsFilter, Reply, SimpleCommand, StreamCommand,
    SystemClock, UuidIdGen,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn, Instrument};

/// Handle to a coordinated connection
///
/// Cheap to clone; every clone talks to the same coordinator. The native
/// connection itself is never reachable from here.
pub struct Connection<D: Driver> {
    id: String,
    name: String,
    mailbox: mpsc::Sender<Message<D>>,
    request_timeout: Option<Duration>,
}

impl<D: Driver> Clone for Connection<D> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            mailbox: self.mailbox.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<D: Driver> std::fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<D: Driver> Connection<D> {
    /// Open a native connection, attach it through `registry` and start serving
    pub async fn start<R>(
        driver: Arc<D>,
        registry: &R,
        config: ConnectionConfig,
    ) -> Result<Self, ConnectionError>
    where
        R: DatabaseRegistry<D> + ?Sized,
    {
        Self::start_with(driver, registry, config, SystemClock, UuidIdGen).await
    }

    /// Like [`Connection::start`] with an explicit clock and id source
    pub async fn start_with<R, C, I>(
        driver: Arc<D>,
        registry: &R,
        config: ConnectionConfig,
        clock: C,
        ids: I,
    ) -> Result<Self, ConnectionError>
    where
        R: DatabaseRegistry<D> + ?Sized,
        C: Clock,
        I: IdGen,
    {
        config
            .validate()
            .map_err(InitializationError::Config)?;

        let id = ids.next();
        let span = tracing::info_span!("connection", id = %id, name = %config.name);

        let native = open(&driver, registry, &config)
            .instrument(span.clone())
            .await?;

        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let settings = CoordinatorSettings {
            id: id.clone(),
            lock: LockConfig {
                name: config.name.clone(),
                stale_after: config.stale_after,
            },
            stale_check_interval: config.stale_check_interval,
        };
        let coordinator = Coordinator::new(driver, native, rx, settings, clock, ids);
        tokio::spawn(coordinator.run().instrument(span));

        Ok(Self {
            id,
            name: config.name,
            mailbox: tx,
            request_timeout: config.request_timeout,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a command that returns a plain value, in queue order
    pub async fn submit(&self, command: SimpleCommand) -> Result<Reply<D::Schema>, ConnectionError> {
        let name = command.name();
        let (reply, rx) = oneshot::channel();
        self.send(Message::Enqueue(Request::Submit { command, reply }))
            .await?;
        self.wait(name, rx).await
    }

    /// Run a streaming command; the connection stays locked until the lease's
    /// token is released or dropped
    pub async fn acquire(&self, command: StreamCommand) -> Result<Lease<D::Stream>, ConnectionError> {
        let name = command.name();
        let (reply, rx) = oneshot::channel();
        self.send(Message::Enqueue(Request::Acquire { command, reply }))
            .await?;
        self.wait(name, rx).await
    }

    /// Unlock the connection held by `token`
    ///
    /// Not queued: it takes effect as soon as the coordinator reads it. A
    /// refused token comes back in [`ConnectionError::TokenRejected`]; see
    /// [`ConnectionError::into_rejected_token`].
    pub async fn release(&self, token: UnlockToken) -> Result<(), ConnectionError> {
        if token.connection_id() != self.id {
            return Err(ConnectionError::TokenRejected {
                reason: MisuseError::ForeignToken {
                    owner: token.connection_id().to_string(),
                    connection: self.id.clone(),
                },
                token,
            });
        }
        let (reply, rx) = oneshot::channel();
        self.send(Message::Release { token, reply }).await?;
        rx.await.map_err(|_| ConnectionError::Closed)?
    }

    /// Release the native connection once every earlier request has run.
    ///
    /// Afterwards every operation, including another release, fails with
    /// [`adbx_core::MisuseError::ConnectionReleased`].
    pub async fn release_connection(&self) -> Result<(), ConnectionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Message::Enqueue(Request::Close { reply })).await?;
        self.wait("release_connection", rx).await
    }

    pub async fn get_info(&self, codes: Vec<u32>) -> Result<Lease<D::Stream>, ConnectionError> {
        self.acquire(StreamCommand::GetInfo { codes }).await
    }

    pub async fn get_objects(
        &self,
        filter: ObjectsFilter,
    ) -> Result<Lease<D::Stream>, ConnectionError> {
        self.acquire(StreamCommand::GetObjects(filter)).await
    }

    pub async fn get_table_types(&self) -> Result<Lease<D::Stream>, ConnectionError> {
        self.acquire(StreamCommand::GetTableTypes).await
    }

    pub async fn get_table_schema(
        &self,
        catalog: Option<&str>,
        db_schema: Option<&str>,
        table: &str,
    ) -> Result<D::Schema, ConnectionError> {
        let reply = self
            .submit(SimpleCommand::GetTableSchema {
                catalog: catalog.map(str::to_string),
                db_schema: db_schema.map(str::to_string),
                table: table.to_string(),
            })
            .await?;
        reply.into_schema().ok_or(ConnectionError::UnexpectedReply {
            command: "get_table_schema",
        })
    }

    pub async fn commit(&self) -> Result<(), ConnectionError> {
        self.submit(SimpleCommand::Commit).await.map(|_| ())
    }

    pub async fn rollback(&self) -> Result<(), ConnectionError> {
        self.submit(SimpleCommand::Rollback).await.map(|_| ())
    }

    pub async fn set_option(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ConnectionError> {
        self.submit(SimpleCommand::SetOption {
            key: key.into(),
            value: value.into(),
        })
        .await
        .map(|_| ())
    }

    async fn send(&self, message: Message<D>) -> Result<(), ConnectionError> {
        self.mailbox
            .send(message)
            .await
            .map_err(|_| ConnectionError::Closed)
    }

    async fn wait<T>(
        &self,
        command: &'static str,
        rx: oneshot::Receiver<Result<T, ConnectionError>>,
    ) -> Result<T, ConnectionError> {
        let reply = match self.request_timeout {
            Some(after) => tokio::time::timeout(after, rx)
                .await
                .map_err(|_| ConnectionError::Timeout { command, after })?,
            None => rx.await,
        };
        reply.map_err(|_| ConnectionError::Closed)?
    }
}

/// Create the native connection, apply options and attach it.
///
/// Anything that fails after the handle exists releases it again.
async fn open<D, R>(
    driver: &Arc<D>,
    registry: &R,
    config: &ConnectionConfig,
) -> Result<D::Connection, InitializationError>
where
    D: Driver,
    R: DatabaseRegistry<D> + ?Sized,
{
    let mut native = driver.connection_new().map_err(|e| {
        error!(error = %e, "could not create native connection");
        InitializationError::Create(e)
    })?;

    for option in &config.options {
        if let Err(source) = driver.connection_set_option(&mut native, &option.key, &option.value) {
            error!(key = %option.key, error = %source, "could not set connection option");
            discard(driver.as_ref(), &mut native);
            return Err(InitializationError::SetOption {
                key: option.key.clone(),
                source,
            });
        }
    }

    if let Err(e) = registry.attach_connection(&mut native).await {
        error!(error = %e, "database registry refused the connection");
        discard(driver.as_ref(), &mut native);
        return Err(InitializationError::Attach(e));
    }

    info!(options = config.options.len(), "connection attached");
    Ok(native)
}

fn discard<D: Driver>(driver: &D, native: &mut D::Connection) {
    if let Err(e) = driver.connection_release(native) {
        warn!(error = %e, "failed to release native connection after failed startup");
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
