//! Reader connection manager.
//!
//! The manager owns the lifecycle of the physical link: it probes host
//! capability, opens the transport, runs exactly one read-loop session at
//! a time, and is the only component that mutates the reader status. The
//! read loop itself never touches the status; its outcome is consumed by
//! the manager-owned session epilogue, which applies the transition and
//! closes the port.
//!
//! # Architecture
//!
//! ```text
//! caller ──activate/connect/disconnect──► ReaderManager ──open──► SerialTransport
//!                                              │
//!                                        spawn session
//!                                              │
//!                                     ┌────────▼────────┐
//!                                     │  FrameDecoder   │──► Event Channel ──► caller
//!                                     │  read loop      │      (scans + notices)
//!                                     └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use badgelink_reader::{ReaderEvent, ReaderManager};
//! use badgelink_transport::mock::MockSerial;
//! use badgelink_transport::types::DeviceSelector;
//!
//! #[tokio::main]
//! async fn main() -> badgelink_core::Result<()> {
//!     let (transport, _device) = MockSerial::new();
//!     let (mut reader, mut events) = ReaderManager::new(transport);
//!
//!     reader.activate().await?;
//!     reader.connect(&DeviceSelector::any()).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         if let ReaderEvent::Scan(scan) = event {
//!             println!("card {}", scan.uid);
//!         }
//!     }
//!
//!     reader.deactivate().await;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex};

use badgelink_core::{
    CardUid, Error, Notice, Result, ScanEvent, constants::EVENT_CHANNEL_CAPACITY,
};
use badgelink_transport::{
    SerialPort, SerialTransport,
    types::{DeviceSelector, LinkParams},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::decoder::{FrameDecoder, LoopExit};
use crate::events::{EventStream, ReaderEvent};
use crate::status::{ReaderStatus, StatusCell};

/// One open read-loop session.
///
/// At most one exists at a time; the port itself lives inside the session
/// task so that it is closed exactly once, by the session epilogue.
struct Session {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Connection manager for a serial-attached identity-card reader.
///
/// Construction hands back the manager and the [`EventStream`] carrying
/// scan events and notices. All lifecycle operations are methods here;
/// status transitions are deterministic given the current status, the
/// operation, and its outcome.
pub struct ReaderManager<T: SerialTransport> {
    transport: T,
    status: StatusCell,
    session: Option<Session>,
    assigned: Arc<Mutex<Option<CardUid>>>,
    event_tx: mpsc::Sender<ReaderEvent>,
}

impl<T: SerialTransport> ReaderManager<T> {
    /// Create a manager bound to the given transport.
    ///
    /// Returns the manager and the event stream the caller consumes.
    pub fn new(transport: T) -> (Self, EventStream) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let manager = Self {
            transport,
            status: StatusCell::new(),
            session: None,
            assigned: Arc::new(Mutex::new(None)),
            event_tx,
        };

        (manager, EventStream::new(event_rx))
    }

    /// Current reader status.
    ///
    /// O(1); always reflects the last completed transition.
    pub fn current_status(&self) -> ReaderStatus {
        self.status.get()
    }

    /// The currently assigned identifier, if any.
    ///
    /// Set by every accepted scan (automatic or manual), cleared by
    /// [`ReaderManager::clear_identifier`].
    pub fn current_identifier(&self) -> Option<CardUid> {
        lock_cell(&self.assigned).clone()
    }

    /// Activate the adapter.
    ///
    /// Probes the transport capability: a capable host moves the status
    /// to `Ready`; a host without serial support moves it to `Error`,
    /// which is terminal until a capable host activates again.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityMissing` on an incapable host, or
    /// `Error::InvalidStatusTransition` when called while active.
    pub async fn activate(&mut self) -> Result<()> {
        let from = self.status.get();
        if !matches!(from, ReaderStatus::Offline | ReaderStatus::Error) {
            return Err(Error::InvalidStatusTransition {
                from: from.to_string(),
                to: ReaderStatus::Ready.to_string(),
            });
        }

        if !self.transport.is_available() {
            self.status.transition(ReaderStatus::Error)?;
            self.notify(Notice::error("Serial capability missing on this host"))
                .await;
            return Err(Error::CapabilityMissing(
                "host has no serial-stream support".to_string(),
            ));
        }

        self.status.transition(ReaderStatus::Ready)?;
        info!("reader adapter activated");
        Ok(())
    }

    /// Deactivate the adapter from any state.
    ///
    /// Cancels any active read loop, waits for it to release the port,
    /// and moves the status to `Offline`. Idempotent: deactivating an
    /// offline adapter is a no-op.
    pub async fn deactivate(&mut self) {
        self.teardown_session().await;
        // Always legal; failure is unreachable by the transition table.
        if let Err(e) = self.status.transition(ReaderStatus::Offline) {
            warn!(error = %e, "deactivate transition rejected");
        }
        debug!("reader adapter deactivated");
    }

    /// Open a connection to a reader matching the selector.
    ///
    /// Valid from `Ready` or `Error`. On success the status passes
    /// through `Connected` (port open) and lands on `Scanning` with the
    /// read loop running. On failure the status is `Error`, a
    /// connection-failed notice is emitted, and no connection is kept.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStatusTransition` when a connection is
    /// already open or the adapter is offline, `Error::ConnectionFailed`
    /// when the transport rejects the selector or the open fails.
    pub async fn connect(&mut self, selector: &DeviceSelector) -> Result<()> {
        let from = self.status.get();
        if !matches!(from, ReaderStatus::Ready | ReaderStatus::Error) {
            return Err(Error::InvalidStatusTransition {
                from: from.to_string(),
                to: ReaderStatus::Connected.to_string(),
            });
        }

        // A prior session can only linger here in an already-exited state
        // (its epilogue ran, or we would still be Connected/Scanning).
        self.session = None;

        let port = match self.transport.open(selector, LinkParams::default()).await {
            Ok(port) => port,
            Err(e) => {
                self.status.transition(ReaderStatus::Error)?;
                self.notify(Notice::error(format!("Reader connection failed: {e}")))
                    .await;
                return Err(Error::ConnectionFailed(e.to_string()));
            }
        };

        self.status.transition(ReaderStatus::Connected)?;
        self.status.transition(ReaderStatus::Scanning)?;

        let cancel = CancellationToken::new();
        let decoder = FrameDecoder::new(
            cancel.clone(),
            self.event_tx.clone(),
            Arc::clone(&self.assigned),
        );
        let handle = tokio::spawn(run_session(
            port,
            decoder,
            self.status.clone(),
            self.event_tx.clone(),
        ));

        self.session = Some(Session { cancel, handle });
        info!("reader connected, scanning");
        Ok(())
    }

    /// Close the current connection.
    ///
    /// Valid from `Connected`, `Scanning`, or `Error`. Cancels the read
    /// loop and waits for it to release and close the port before the
    /// status moves to `Ready`; once this returns, no scan event from the
    /// closed connection will be delivered.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStatusTransition` when no connection state
    /// is held (status `Offline` or `Ready`).
    pub async fn disconnect(&mut self) -> Result<()> {
        let from = self.status.get();
        if !matches!(
            from,
            ReaderStatus::Connected | ReaderStatus::Scanning | ReaderStatus::Error
        ) {
            return Err(Error::InvalidStatusTransition {
                from: from.to_string(),
                to: ReaderStatus::Ready.to_string(),
            });
        }

        self.teardown_session().await;

        // The session epilogue may already have moved us to Ready (clean
        // peer close racing this call); that is not an error.
        if self.status.get() != ReaderStatus::Ready {
            self.status.transition(ReaderStatus::Ready)?;
        }
        info!("reader disconnected");
        Ok(())
    }

    /// Submit an operator-entered identifier.
    ///
    /// Runs the exact validation used by the automatic path. Accepted
    /// input becomes a `Manual` scan event, is emitted on the event
    /// stream, and updates the assigned identifier. Rejected input emits
    /// a warning notice and leaves all state untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUidFormat` when the input does not strip to
    /// 8-16 hex characters.
    pub async fn submit_manual_identifier(&mut self, text: &str) -> Result<ScanEvent> {
        let uid = match CardUid::parse(text) {
            Ok(uid) => uid,
            Err(e) => {
                self.notify(Notice::warning(format!("Identifier rejected: {e}")))
                    .await;
                return Err(e);
            }
        };

        *lock_cell(&self.assigned) = Some(uid.clone());

        let event = ScanEvent::manual(uid.clone());
        if self
            .event_tx
            .send(ReaderEvent::Scan(event.clone()))
            .await
            .is_err()
        {
            debug!("event receiver dropped, manual scan not delivered");
        }
        self.notify(Notice::success(format!("Card {uid} accepted"))).await;

        Ok(event)
    }

    /// Clear the assigned identifier.
    ///
    /// Emits no scan event: a cleared state is out-of-band, not a
    /// zero-length identifier. Returns the identifier that was cleared,
    /// if any.
    pub fn clear_identifier(&mut self) -> Option<CardUid> {
        lock_cell(&self.assigned).take()
    }

    /// Cancel and join the active session, if any.
    ///
    /// The session task closes the port in its epilogue, so after the
    /// join returns the device is released and no further events from
    /// that connection can be emitted.
    async fn teardown_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            if let Err(e) = session.handle.await {
                warn!(error = %e, "read loop task failed to join");
            }
        }
    }

    async fn notify(&self, notice: Notice) {
        if self
            .event_tx
            .send(ReaderEvent::Notice(notice))
            .await
            .is_err()
        {
            debug!("event receiver dropped, notice not delivered");
        }
    }
}

/// One connection's read-loop session plus its epilogue.
///
/// The epilogue is manager-owned code: it closes the port exactly once
/// and converts the loop outcome into a status transition. Cancelled
/// exits apply no transition; the cancelling operation drives the status.
async fn run_session<P: SerialPort>(
    mut port: P,
    decoder: FrameDecoder,
    status: StatusCell,
    events: mpsc::Sender<ReaderEvent>,
) {
    let exit = decoder.run(&mut port).await;

    // Best-effort teardown: close errors never block the transition.
    if let Err(e) = port.close().await {
        warn!(error = %e, "error closing reader port");
    }

    match exit {
        LoopExit::Cancelled => {
            debug!("read loop cancelled");
        }
        LoopExit::EndOfStream => {
            info!("reader stream closed by peer");
            if events
                .send(ReaderEvent::Notice(Notice::info("Reader stream closed")))
                .await
                .is_err()
            {
                debug!("event receiver dropped, notice not delivered");
            }
            if let Err(e) = status.transition(ReaderStatus::Ready) {
                debug!(error = %e, "end-of-stream transition superseded");
            }
        }
        LoopExit::ReadFailed(message) => {
            warn!(%message, "reader stream failed");
            if events
                .send(ReaderEvent::Notice(Notice::error(format!(
                    "Reader read failed: {message}"
                ))))
                .await
                .is_err()
            {
                debug!("event receiver dropped, notice not delivered");
            }
            if let Err(e) = status.transition(ReaderStatus::Error) {
                debug!(error = %e, "read-failure transition superseded");
            }
        }
    }
}

fn lock_cell(cell: &Mutex<Option<CardUid>>) -> std::sync::MutexGuard<'_, Option<CardUid>> {
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgelink_transport::mock::MockSerial;

    #[tokio::test]
    async fn test_new_manager_starts_offline() {
        let (transport, _device) = MockSerial::new();
        let (manager, _events) = ReaderManager::new(transport);
        assert_eq!(manager.current_status(), ReaderStatus::Offline);
        assert_eq!(manager.current_identifier(), None);
    }

    #[tokio::test]
    async fn test_connect_requires_activation() {
        let (transport, _device) = MockSerial::new();
        let (mut manager, _events) = ReaderManager::new(transport);

        let result = manager.connect(&DeviceSelector::any()).await;
        assert!(matches!(
            result,
            Err(Error::InvalidStatusTransition { .. })
        ));
        assert_eq!(manager.current_status(), ReaderStatus::Offline);
    }

    #[tokio::test]
    async fn test_double_connect_refused() {
        let (transport, _device) = MockSerial::new();
        let (mut manager, _events) = ReaderManager::new(transport);

        manager.activate().await.unwrap();
        manager.connect(&DeviceSelector::any()).await.unwrap();

        let result = manager.connect(&DeviceSelector::any()).await;
        assert!(matches!(
            result,
            Err(Error::InvalidStatusTransition { .. })
        ));
        assert_eq!(manager.current_status(), ReaderStatus::Scanning);

        manager.deactivate().await;
    }

    #[tokio::test]
    async fn test_clear_identifier_returns_previous() {
        let (transport, _device) = MockSerial::new();
        let (mut manager, mut events) = ReaderManager::new(transport);

        let event = manager.submit_manual_identifier("045a2e92f1").await.unwrap();
        assert_eq!(event.uid.as_str(), "045A2E92F1");
        assert_eq!(
            manager.current_identifier().map(|u| u.as_str().to_string()),
            Some("045A2E92F1".to_string())
        );

        let cleared = manager.clear_identifier();
        assert_eq!(cleared, Some(event.uid));
        assert_eq!(manager.current_identifier(), None);

        // Clearing emitted nothing beyond the manual entry's own events.
        let mut scans = 0;
        while let Some(event) = events.try_recv() {
            if matches!(event, ReaderEvent::Scan(_)) {
                scans += 1;
            }
        }
        assert_eq!(scans, 1);
    }
}
