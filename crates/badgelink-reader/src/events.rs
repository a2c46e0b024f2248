//! Caller-facing reader events.
//!
//! All output from the adapter flows through a single channel: validated
//! scan events and `(severity, message)` notices. The consuming side gets
//! an [`EventStream`] when constructing the manager and decides entirely
//! on its own how to present what it receives.

use badgelink_core::{Notice, ScanEvent};
use tokio::sync::mpsc;

/// Unified event from the reader adapter.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ReaderEvent {
    /// A validated identifier observation (automatic or manual).
    Scan(ScanEvent),

    /// A user-facing notification.
    Notice(Notice),
}

/// Receiving half of the reader event channel.
///
/// # Examples
///
/// ```no_run
/// use badgelink_reader::{EventStream, ReaderEvent};
///
/// # async fn example(mut events: EventStream) {
/// while let Some(event) = events.recv().await {
///     match event {
///         ReaderEvent::Scan(scan) => println!("card {}", scan.uid),
///         ReaderEvent::Notice(notice) => println!("{}", notice),
///         _ => {}
///     }
/// }
/// # }
/// ```
pub struct EventStream {
    rx: mpsc::Receiver<ReaderEvent>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::Receiver<ReaderEvent>) -> Self {
        Self { rx }
    }

    /// Receive the next event.
    ///
    /// Blocks asynchronously until an event is available. Returns `None`
    /// once the manager has been dropped and all buffered events are
    /// consumed.
    pub async fn recv(&mut self) -> Option<ReaderEvent> {
        self.rx.recv().await
    }

    /// Receive an event without waiting.
    ///
    /// Returns `None` if no event is currently buffered.
    pub fn try_recv(&mut self) -> Option<ReaderEvent> {
        self.rx.try_recv().ok()
    }
}
