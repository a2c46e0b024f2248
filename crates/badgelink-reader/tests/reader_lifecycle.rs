//! Integration tests for the reader connection lifecycle.
//!
//! These tests drive the full stack end-to-end: manager, status machine,
//! read loop, and event stream, against the mock transport playing the
//! device side of the line. They cover the lifecycle guarantees
//! (activation, connection, teardown, idempotent deactivation) and the
//! concrete decode scenarios for line-mode card readers.

use badgelink_core::{Error, ScanSource, Severity};
use badgelink_reader::{EventStream, ReaderEvent, ReaderManager, ReaderStatus};
use badgelink_transport::mock::{MockSerial, MockSerialHandle};
use badgelink_transport::types::DeviceSelector;
use std::time::Duration;

/// Common test UIDs
mod test_data {
    /// Raw line emitted by the reader for one card
    pub const CARD_LINE_RAW: &str = "045a2e92";

    /// Canonical form of `CARD_LINE_RAW`
    pub const CARD_CANONICAL: &str = "045A2E92";

    /// A ten-character manual entry
    pub const MANUAL_RAW: &str = "045a2e92f1";

    /// Canonical form of `MANUAL_RAW`
    pub const MANUAL_CANONICAL: &str = "045A2E92F1";
}

type MockManager = ReaderManager<MockSerial>;

fn setup() -> (MockManager, EventStream, MockSerialHandle) {
    let (transport, device) = MockSerial::new();
    let (manager, events) = ReaderManager::new(transport);
    (manager, events, device)
}

async fn setup_scanning() -> (MockManager, EventStream, MockSerialHandle) {
    let (mut manager, events, device) = setup();
    manager.activate().await.unwrap();
    manager.connect(&DeviceSelector::any()).await.unwrap();
    (manager, events, device)
}

/// Receive events until the next scan, failing the test on timeout.
async fn next_scan(events: &mut EventStream) -> badgelink_core::ScanEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("timed out waiting for a scan event")
            .expect("event stream closed");
        if let ReaderEvent::Scan(scan) = event {
            return scan;
        }
    }
}

/// Drain everything currently buffered on the stream.
fn drain(events: &mut EventStream) -> Vec<ReaderEvent> {
    let mut drained = Vec::new();
    while let Some(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

// ============================================================================
// Activation and capability probing
// ============================================================================

#[tokio::test]
async fn test_activate_on_capable_host() {
    let (mut manager, _events, _device) = setup();

    manager.activate().await.unwrap();
    assert_eq!(manager.current_status(), ReaderStatus::Ready);
}

#[tokio::test]
async fn test_activate_on_capability_missing_host_never_ready() {
    let (mut manager, mut events, device) = setup();
    device.set_available(false);

    let result = manager.activate().await;
    assert!(matches!(result, Err(Error::CapabilityMissing(_))));
    assert_eq!(manager.current_status(), ReaderStatus::Error);

    let notices = drain(&mut events);
    assert!(notices.iter().any(|event| matches!(
        event,
        ReaderEvent::Notice(notice) if notice.severity == Severity::Error
    )));

    // Terminal until reactivated: retrying on the same host fails again.
    let retry = manager.activate().await;
    assert!(retry.is_err());
    assert_eq!(manager.current_status(), ReaderStatus::Error);
}

#[tokio::test]
async fn test_activate_recovers_once_host_is_capable() {
    let (mut manager, _events, device) = setup();
    device.set_available(false);
    let _ = manager.activate().await;
    assert_eq!(manager.current_status(), ReaderStatus::Error);

    device.set_available(true);
    manager.activate().await.unwrap();
    assert_eq!(manager.current_status(), ReaderStatus::Ready);
}

// ============================================================================
// Connect / disconnect lifecycle
// ============================================================================

#[tokio::test]
async fn test_connect_then_disconnect_status_flow() {
    let (mut manager, _events, device) = setup();

    manager.activate().await.unwrap();
    manager.connect(&DeviceSelector::any()).await.unwrap();
    assert_eq!(manager.current_status(), ReaderStatus::Scanning);
    assert!(device.is_open());

    manager.disconnect().await.unwrap();
    assert_eq!(manager.current_status(), ReaderStatus::Ready);
    assert!(!device.is_open());
    assert_eq!(device.close_count(), 1);
}

#[tokio::test]
async fn test_connect_failure_reports_and_allows_retry() {
    let (mut manager, mut events, device) = setup();

    manager.activate().await.unwrap();
    device.fail_next_open("device busy");

    let result = manager.connect(&DeviceSelector::any()).await;
    assert!(matches!(result, Err(Error::ConnectionFailed(_))));
    assert_eq!(manager.current_status(), ReaderStatus::Error);

    let notices = drain(&mut events);
    assert!(notices.iter().any(|event| matches!(
        event,
        ReaderEvent::Notice(notice)
            if notice.severity == Severity::Error && notice.message.contains("connection failed")
    )));

    // Recoverable by retrying connect() from Error.
    manager.connect(&DeviceSelector::any()).await.unwrap();
    assert_eq!(manager.current_status(), ReaderStatus::Scanning);

    manager.deactivate().await;
}

#[tokio::test]
async fn test_connect_selector_rejection() {
    let (mut manager, _events, _device) = setup();

    manager.activate().await.unwrap();
    let selector = DeviceSelector::any().allow_vendor(0x1234);

    let result = manager.connect(&selector).await;
    assert!(matches!(result, Err(Error::ConnectionFailed(_))));
    assert_eq!(manager.current_status(), ReaderStatus::Error);
}

#[tokio::test]
async fn test_disconnect_without_connection_is_invalid() {
    let (mut manager, _events, _device) = setup();

    manager.activate().await.unwrap();
    let result = manager.disconnect().await;
    assert!(matches!(result, Err(Error::InvalidStatusTransition { .. })));
    assert_eq!(manager.current_status(), ReaderStatus::Ready);
}

#[tokio::test]
async fn test_deactivate_from_any_state_and_idempotent() {
    let (mut manager, _events, device) = setup();

    // From Offline, twice in a row: no error, status Offline both times.
    manager.deactivate().await;
    assert_eq!(manager.current_status(), ReaderStatus::Offline);
    manager.deactivate().await;
    assert_eq!(manager.current_status(), ReaderStatus::Offline);

    // From Scanning: tears the connection down.
    manager.activate().await.unwrap();
    manager.connect(&DeviceSelector::any()).await.unwrap();
    manager.deactivate().await;
    assert_eq!(manager.current_status(), ReaderStatus::Offline);
    assert!(!device.is_open());
}

// ============================================================================
// Automatic scan path
// ============================================================================

#[tokio::test]
async fn test_chunk_decodes_to_automatic_scan_event() {
    use test_data::*;

    let (mut manager, mut events, device) = setup_scanning().await;

    device.present_uid(CARD_LINE_RAW).await.unwrap();

    let scan = next_scan(&mut events).await;
    assert_eq!(scan.uid.as_str(), CARD_CANONICAL);
    assert_eq!(scan.source, ScanSource::Automatic);
    assert!(scan.observed_at_epoch_millis() > 0);

    // The scan also becomes the assigned identifier.
    assert_eq!(
        manager.current_identifier().map(|u| u.as_str().to_string()),
        Some(CARD_CANONICAL.to_string())
    );

    manager.deactivate().await;
}

#[tokio::test]
async fn test_short_chunk_produces_no_event_and_no_status_change() {
    let (mut manager, mut events, device) = setup_scanning().await;

    device.send_chunk(b"12".as_slice()).await.unwrap();
    // Give the read loop a chance to consume the chunk.
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(manager.current_status(), ReaderStatus::Scanning);
    assert!(drain(&mut events).is_empty());

    manager.deactivate().await;
}

#[tokio::test]
async fn test_read_error_transitions_to_error_status() {
    let (mut manager, mut events, device) = setup_scanning().await;

    device.fail_read("device unplugged").await.unwrap();

    // The session epilogue reports the failure and releases the port.
    let mut saw_error_notice = false;
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        saw_error_notice = drain(&mut events).iter().any(|event| {
            matches!(
                event,
                ReaderEvent::Notice(notice) if notice.severity == Severity::Error
            )
        }) || saw_error_notice;
        if manager.current_status() == ReaderStatus::Error {
            break;
        }
    }
    assert_eq!(manager.current_status(), ReaderStatus::Error);
    assert!(saw_error_notice);
    assert!(!device.is_open());

    // Recoverable by connecting again.
    manager.connect(&DeviceSelector::any()).await.unwrap();
    assert_eq!(manager.current_status(), ReaderStatus::Scanning);
    manager.deactivate().await;
}

#[tokio::test]
async fn test_clean_peer_close_returns_to_ready() {
    let (mut manager, mut events, device) = setup_scanning().await;

    device.close_stream();

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if manager.current_status() == ReaderStatus::Ready {
            break;
        }
    }
    assert_eq!(manager.current_status(), ReaderStatus::Ready);

    let notices = drain(&mut events);
    assert!(notices.iter().any(|event| matches!(
        event,
        ReaderEvent::Notice(notice) if notice.severity == Severity::Info
    )));
}

#[tokio::test(flavor = "current_thread")]
async fn test_no_scan_event_after_disconnect_returns() {
    use test_data::*;

    let (mut manager, mut events, device) = setup_scanning().await;

    // A chunk is already buffered on the transport when disconnect is
    // issued; on a current-thread runtime the read loop has not polled
    // it yet, so cancellation races the in-flight data.
    device.present_uid(CARD_LINE_RAW).await.unwrap();
    manager.disconnect().await.unwrap();

    // Everything on the stream after disconnect returned: no scans.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let leaked_scans = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, ReaderEvent::Scan(_)))
        .count();
    assert_eq!(leaked_scans, 0);
}

// ============================================================================
// Manual entry path
// ============================================================================

#[tokio::test]
async fn test_manual_entry_accepted_and_canonicalised() {
    use test_data::*;

    let (mut manager, mut events, _device) = setup();

    let event = manager.submit_manual_identifier(MANUAL_RAW).await.unwrap();
    assert_eq!(event.uid.as_str(), MANUAL_CANONICAL);
    assert_eq!(event.source, ScanSource::Manual);

    let scan = next_scan(&mut events).await;
    assert_eq!(scan, event);
}

#[tokio::test]
async fn test_manual_entry_rejected_with_warning_notice() {
    let (mut manager, mut events, _device) = setup();

    // Strips to 7 hex chars: one short of the minimum.
    let result = manager.submit_manual_identifier("zz-04-5A-2E-9").await;
    assert!(matches!(result, Err(Error::InvalidUidFormat(_))));

    // No state change, no scan event, one warning for the operator.
    assert_eq!(manager.current_status(), ReaderStatus::Offline);
    assert_eq!(manager.current_identifier(), None);

    let drained = drain(&mut events);
    assert!(!drained.iter().any(|e| matches!(e, ReaderEvent::Scan(_))));
    assert!(drained.iter().any(|event| matches!(
        event,
        ReaderEvent::Notice(notice) if notice.severity == Severity::Warning
    )));
}

#[tokio::test]
async fn test_manual_and_automatic_paths_agree() {
    use test_data::*;

    // The same raw text accepted through both paths yields the same
    // canonical identifier.
    let (mut manager, mut events, device) = setup_scanning().await;

    device.present_uid(CARD_LINE_RAW).await.unwrap();
    let automatic = next_scan(&mut events).await;

    let manual = manager.submit_manual_identifier(CARD_LINE_RAW).await.unwrap();

    assert_eq!(automatic.uid, manual.uid);
    assert_eq!(automatic.source, ScanSource::Automatic);
    assert_eq!(manual.source, ScanSource::Manual);

    manager.deactivate().await;
}
