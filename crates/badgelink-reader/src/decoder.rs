//! Frame decoding for the reader byte stream.
//!
//! The decoder turns an open port's chunks into validated scan events.
//! Framing is deliberately simple: readers in this family emit one line
//! per physical card read, so each chunk is treated as an independent
//! candidate frame with its trailing CR/LF stripped. A reader that split
//! one card read across chunks, or batched several reads into one chunk,
//! would need delimiter-based buffering here; see `decode_frame`.
//!
//! The read loop is a cancellable cooperative task: it suspends on the
//! next chunk, observes cancellation at that suspension point, and
//! re-checks the cancellation flag before emitting anything it decoded.

use badgelink_core::{CardUid, Notice, ScanEvent, constants::MIN_UID_LENGTH};
use badgelink_transport::SerialPort;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::events::ReaderEvent;

/// Why the read loop exited.
///
/// Cancellation is a normal exit, never an error: the loop's contract is
/// that a cancelled read simply stops producing.
#[derive(Debug)]
pub(crate) enum LoopExit {
    /// Cancellation was requested by the manager.
    Cancelled,

    /// The peer closed the stream cleanly.
    EndOfStream,

    /// The stream raised a read error.
    ReadFailed(String),
}

/// Decode one raw chunk into a card UID.
///
/// The chunk is decoded as text (invalid bytes replaced), trailing
/// carriage-return/line-feed characters are stripped, and the result is a
/// candidate frame only once its trimmed length reaches the minimum UID
/// length. Candidate frames go through the same extraction as manual
/// entry.
///
/// Returns `None` for noise: short transients during card insertion and
/// removal are expected and must not surface as errors.
///
/// # Examples
///
/// ```
/// use badgelink_reader::decode_frame;
///
/// let uid = decode_frame(b"045a2e92\r\n").expect("one card read per chunk");
/// assert_eq!(uid.as_str(), "045A2E92");
///
/// assert!(decode_frame(b"12").is_none());
/// ```
pub fn decode_frame(chunk: &[u8]) -> Option<CardUid> {
    let text = String::from_utf8_lossy(chunk);
    let frame = text.trim_end_matches(['\r', '\n']);
    if frame.chars().count() < MIN_UID_LENGTH {
        return None;
    }
    CardUid::extract(frame)
}

/// The suspendable read loop bound to one open connection.
///
/// Borrows the port for the duration of [`FrameDecoder::run`]; closing
/// the port afterwards is the session owner's job.
pub(crate) struct FrameDecoder {
    cancel: CancellationToken,
    events: mpsc::Sender<ReaderEvent>,
    assigned: Arc<Mutex<Option<CardUid>>>,
}

impl FrameDecoder {
    pub(crate) fn new(
        cancel: CancellationToken,
        events: mpsc::Sender<ReaderEvent>,
        assigned: Arc<Mutex<Option<CardUid>>>,
    ) -> Self {
        Self {
            cancel,
            events,
            assigned,
        }
    }

    /// Run the read loop until cancellation, end of stream, or a fault.
    pub(crate) async fn run<P: SerialPort>(&self, port: &mut P) -> LoopExit {
        loop {
            let chunk = tokio::select! {
                _ = self.cancel.cancelled() => return LoopExit::Cancelled,
                read = port.read_chunk() => match read {
                    Ok(Some(chunk)) => chunk,
                    Ok(None) => return LoopExit::EndOfStream,
                    Err(e) => return LoopExit::ReadFailed(e.to_string()),
                },
            };

            let Some(uid) = decode_frame(&chunk) else {
                trace!(len = chunk.len(), "discarding noise frame");
                continue;
            };

            // Liveness check: nothing decoded from a cancelled connection
            // may be emitted, even if the chunk was already in flight.
            if self.cancel.is_cancelled() {
                return LoopExit::Cancelled;
            }

            debug!(%uid, "card read");
            *self.lock_assigned() = Some(uid.clone());

            let scan = ReaderEvent::Scan(ScanEvent::automatic(uid.clone()));
            let notice = ReaderEvent::Notice(Notice::success(format!("Card {uid} read")));
            if self.emit(scan).await.is_err() || self.emit(notice).await.is_err() {
                return LoopExit::Cancelled;
            }
        }
    }

    /// Deliver one event, racing the send against cancellation so a full
    /// channel can never stall teardown.
    async fn emit(&self, event: ReaderEvent) -> Result<(), ()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(()),
            sent = self.events.send(event) => sent.map_err(|_| ()),
        }
    }

    fn lock_assigned(&self) -> std::sync::MutexGuard<'_, Option<CardUid>> {
        self.assigned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
