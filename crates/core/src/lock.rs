// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lock state machine
//!
//! A connection is either free or held by exactly one stream lease. The lease
//! ends when its holder releases it or when the holder is detected gone; both
//! paths are keyed by the [`LeaseId`], so a late signal for an old lease can
//! never free a newer one.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Identity of the caller holding the lock
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique id of one acquisition; what an unlock token refers to
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(pub String);

impl LeaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for LeaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lock configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockConfig {
    /// Name used in events, usually the connection name
    pub name: String,
    /// Report a lease as stale once it has been held this long.
    /// Stale leases are only reported, never reclaimed.
    #[serde(default, with = "humantime_serde")]
    pub stale_after: Option<Duration>,
}

impl LockConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stale_after: None,
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }
}

/// Lock state
#[derive(Clone, Debug)]
pub enum LockState {
    Free,
    Held {
        holder: HolderId,
        lease: LeaseId,
        /// Name of the command whose stream holds the lock
        command: String,
        acquired_at: Instant,
        stale_reported: bool,
    },
}

/// Inputs that drive lock transitions
#[derive(Clone, Debug)]
pub enum LockInput {
    Acquire {
        holder: HolderId,
        lease: LeaseId,
        command: String,
    },
    /// The holder released its token
    Release { lease: LeaseId },
    /// The holder's liveness watch fired
    HolderGone { lease: LeaseId },
    /// Periodic check for long-held leases
    Tick,
}

/// Observable outcomes of a transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockEvent {
    Acquired {
        name: String,
        holder: HolderId,
        lease: LeaseId,
        command: String,
    },
    /// Acquire while held; the current lease is untouched
    Denied {
        name: String,
        holder: HolderId,
        current_holder: HolderId,
    },
    Released {
        name: String,
        holder: HolderId,
        lease: LeaseId,
        held_for: Duration,
    },
    HolderGone {
        name: String,
        holder: HolderId,
        lease: LeaseId,
        held_for: Duration,
    },
    /// Release or liveness signal for a lease that is not current
    Ignored { name: String, lease: LeaseId },
    Stale {
        name: String,
        holder: HolderId,
        lease: LeaseId,
        held_for: Duration,
    },
}

/// Exclusive lock over one connection
#[derive(Clone, Debug)]
pub struct Lock {
    pub config: LockConfig,
    pub state: LockState,
}

impl Lock {
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            state: LockState::Free,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self.state, LockState::Free)
    }

    pub fn holder(&self) -> Option<&HolderId> {
        match &self.state {
            LockState::Free => None,
            LockState::Held { holder, .. } => Some(holder),
        }
    }

    pub fn lease(&self) -> Option<&LeaseId> {
        match &self.state {
            LockState::Free => None,
            LockState::Held { lease, .. } => Some(lease),
        }
    }

    pub fn is_held_by(&self, lease: &LeaseId) -> bool {
        self.lease() == Some(lease)
    }

    /// Pure state transition function
    pub fn transition(&self, input: LockInput, clock: &impl Clock) -> (Lock, Vec<LockEvent>) {
        let mut next = self.clone();
        let mut events = Vec::new();
        let name = self.config.name.clone();

        match input {
            LockInput::Acquire {
                holder,
                lease,
                command,
            } => match &self.state {
                LockState::Free => {
                    next.state = LockState::Held {
                        holder: holder.clone(),
                        lease: lease.clone(),
                        command: command.clone(),
                        acquired_at: clock.now(),
                        stale_reported: false,
                    };
                    events.push(LockEvent::Acquired {
                        name,
                        holder,
                        lease,
                        command,
                    });
                }
                LockState::Held {
                    holder: current, ..
                } => {
                    events.push(LockEvent::Denied {
                        name,
                        holder,
                        current_holder: current.clone(),
                    });
                }
            },

            LockInput::Release { lease } => {
                match self.end_lease(&lease, clock) {
                    Some((holder, held_for)) => {
                        next.state = LockState::Free;
                        events.push(LockEvent::Released {
                            name,
                            holder,
                            lease,
                            held_for,
                        });
                    }
                    None => events.push(LockEvent::Ignored { name, lease }),
                }
            }

            LockInput::HolderGone { lease } => {
                match self.end_lease(&lease, clock) {
                    Some((holder, held_for)) => {
                        next.state = LockState::Free;
                        events.push(LockEvent::HolderGone {
                            name,
                            holder,
                            lease,
                            held_for,
                        });
                    }
                    None => events.push(LockEvent::Ignored { name, lease }),
                }
            }

            LockInput::Tick => {
                if let (
                    Some(threshold),
                    LockState::Held {
                        holder,
                        lease,
                        acquired_at,
                        stale_reported,
                        ..
                    },
                ) = (self.config.stale_after, &mut next.state)
                {
                    let held_for = clock.since(*acquired_at);
                    if !*stale_reported && held_for >= threshold {
                        *stale_reported = true;
                        events.push(LockEvent::Stale {
                            name,
                            holder: holder.clone(),
                            lease: lease.clone(),
                            held_for,
                        });
                    }
                }
            }
        }

        (next, events)
    }

    /// Holder and hold duration if `lease` is the current one
    fn end_lease(&self, lease: &LeaseId, clock: &impl Clock) -> Option<(HolderId, Duration)> {
        match &self.state {
            LockState::Held {
                holder,
                lease: current,
                acquired_at,
                ..
            } if current == lease => Some((holder.clone(), clock.since(*acquired_at))),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
