//! Reader connection status state machine.
//!
//! This module models the lifecycle of the physical link as a single
//! authoritative enum mutated only through validated transitions. Nothing
//! outside the connection manager touches the status directly: the read
//! loop reports outcomes and the manager applies the resulting transition.
//!
//! # States
//!
//! - `Offline`: adapter not activated
//! - `Ready`: host capability confirmed, no connection open
//! - `Connected`: port open, read loop not yet running
//! - `Scanning`: read loop consuming the byte stream
//! - `Error`: capability missing, open failed, or the stream faulted
//!
//! # Valid Transitions
//!
//! - Offline → Ready (activate) or Offline → Error (capability missing)
//! - Ready/Error → Connected (connect) or Ready/Error → Error (open failed)
//! - Connected → Scanning (read loop started)
//! - Scanning → Ready (disconnect, clean peer close)
//! - Connected/Scanning → Error (stream fault)
//! - Error → Ready (disconnect)
//! - any → Offline (deactivate, idempotent)

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use badgelink_core::{Error, Result};

/// Connection status of the card reader link.
///
/// Exactly one value at any time, owned by the connection manager.
///
/// # Examples
///
/// ```
/// use badgelink_reader::ReaderStatus;
///
/// assert!(ReaderStatus::Offline.can_transition_to(&ReaderStatus::Ready));
/// assert!(!ReaderStatus::Offline.can_transition_to(&ReaderStatus::Scanning));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderStatus {
    /// Adapter not activated; no capability check performed yet.
    Offline,

    /// Host capability confirmed; no connection open.
    Ready,

    /// Transport port open; read loop not yet running.
    Connected,

    /// Read loop running against the open port.
    Scanning,

    /// Capability missing, open failed, or the stream faulted.
    Error,
}

impl ReaderStatus {
    /// Check if transition to the target status is valid from this one.
    ///
    /// Deactivation is always legal, so every state may transition to
    /// `Offline` (including `Offline` itself, which makes deactivation
    /// idempotent).
    pub fn can_transition_to(&self, target: &ReaderStatus) -> bool {
        matches!(
            (self, target),
            // From Offline: activate
            (ReaderStatus::Offline, ReaderStatus::Ready | ReaderStatus::Error)
            // From Ready: connect opens the port, or fails
            | (ReaderStatus::Ready, ReaderStatus::Connected | ReaderStatus::Error)
            // From Connected: read loop starts, disconnect, or early fault
            | (ReaderStatus::Connected, ReaderStatus::Scanning | ReaderStatus::Ready | ReaderStatus::Error)
            // From Scanning: disconnect / clean peer close, or stream fault
            | (ReaderStatus::Scanning, ReaderStatus::Ready | ReaderStatus::Error)
            // From Error: reconnect attempt, repeated failure, or disconnect
            | (ReaderStatus::Error, ReaderStatus::Connected | ReaderStatus::Error | ReaderStatus::Ready)
            // Deactivate from anywhere
            | (_, ReaderStatus::Offline)
        )
    }

    /// Check if a connection is currently held in this status.
    pub fn is_connected(&self) -> bool {
        matches!(self, ReaderStatus::Connected | ReaderStatus::Scanning)
    }
}

impl fmt::Display for ReaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            ReaderStatus::Offline => "Offline",
            ReaderStatus::Ready => "Ready",
            ReaderStatus::Connected => "Connected",
            ReaderStatus::Scanning => "Scanning",
            ReaderStatus::Error => "Error",
        };
        write!(f, "{}", status_str)
    }
}

/// Shared cell holding the authoritative reader status.
///
/// Cloned into the session task so loop outcomes can be applied as
/// validated transitions; every mutation goes through [`StatusCell::transition`].
#[derive(Debug, Clone)]
pub(crate) struct StatusCell {
    inner: Arc<Mutex<ReaderStatus>>,
}

impl StatusCell {
    /// Create a cell in the initial `Offline` status.
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReaderStatus::Offline)),
        }
    }

    /// Snapshot of the last completed transition.
    pub(crate) fn get(&self) -> ReaderStatus {
        *self.lock()
    }

    /// Apply a validated transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStatusTransition` if the transition is not
    /// in the legal table; the status is left unchanged.
    pub(crate) fn transition(&self, target: ReaderStatus) -> Result<()> {
        let mut current = self.lock();
        if !current.can_transition_to(&target) {
            return Err(Error::InvalidStatusTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }
        tracing::debug!(from = %current, to = %target, "reader status transition");
        *current = target;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReaderStatus> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
