// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream leases and their unlock tokens

use adbx_core::LeaseId;
use tokio::sync::oneshot;

/// One-time capability to unlock a connection after a streaming call
///
/// The token is also the holder's liveness signal: dropping it without passing
/// it to [`crate::Connection::release`] (including when the owning task panics
/// or is aborted) is treated as the holder going away, and the connection
/// unlocks itself. A release that is refused hands the token back through
/// [`crate::ConnectionError::into_rejected_token`].
#[derive(Debug)]
pub struct UnlockToken {
    connection: String,
    lease: LeaseId,
    _alive: oneshot::Sender<()>,
}

impl UnlockToken {
    pub(crate) fn new(connection: String, lease: LeaseId, alive: oneshot::Sender<()>) -> Self {
        Self {
            connection,
            lease,
            _alive: alive,
        }
    }

    pub fn lease(&self) -> &LeaseId {
        &self.lease
    }

    /// Id of the connection this token unlocks
    pub fn connection_id(&self) -> &str {
        &self.connection
    }
}

/// A live stream holding its connection locked
#[derive(Debug)]
pub struct Lease<S> {
    stream: S,
    token: UnlockToken,
}

impl<S> Lease<S> {
    pub(crate) fn new(stream: S, token: UnlockToken) -> Self {
        Self { stream, token }
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn token(&self) -> &UnlockToken {
        &self.token
    }

    /// Split into the stream and its token.
    ///
    /// The connection stays locked until the token is released or dropped,
    /// regardless of what happens to the stream.
    pub fn into_parts(self) -> (S, UnlockToken) {
        (self.stream, self.token)
    }

    /// Keep only the token, discarding the stream
    pub fn into_token(self) -> UnlockToken {
        self.token
    }
}
