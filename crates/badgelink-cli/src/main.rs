//! Demo session against the mock reader.
//!
//! Runs the full adapter stack without physical hardware: activates the
//! manager, connects to the mock transport, scripts a handful of card
//! presentations (including noise and a manual entry), then tears the
//! session down. Useful for eyeballing event flow and log output:
//!
//! ```sh
//! RUST_LOG=badgelink_reader=debug cargo run -p badgelink-cli
//! ```

use std::time::Duration;

use anyhow::Result;
use badgelink_reader::{ReaderEvent, ReaderManager};
use badgelink_transport::mock::{MockSerial, MockSerialHandle};
use badgelink_transport::types::DeviceSelector;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Script the device side: two good reads, one noise transient, then a
/// clean close.
async fn drive_device(device: MockSerialHandle) {
    let reads = ["045a2e92", "04 AB 11 CC 00 11 22 33"];

    for uid in reads {
        tokio::time::sleep(Duration::from_millis(150)).await;
        if device.present_uid(uid).await.is_err() {
            return;
        }
    }

    // Card-removal transient: too short to be a frame
    tokio::time::sleep(Duration::from_millis(150)).await;
    let _ = device.send_chunk(b"12".as_slice()).await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    device.close_stream();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (transport, device) = MockSerial::new();
    let (mut reader, mut events) = ReaderManager::new(transport);

    reader.activate().await?;
    reader.connect(&DeviceSelector::any()).await?;
    info!(status = %reader.current_status(), "session started");

    let script = tokio::spawn(drive_device(device));

    // Consume events until the device closes the stream and the adapter
    // goes quiet.
    loop {
        let event = tokio::time::timeout(Duration::from_secs(1), events.recv()).await;
        match event {
            Ok(Some(ReaderEvent::Scan(scan))) => {
                println!("scan: {} ({}, {}ms)", scan.uid, scan.source, scan.observed_at_epoch_millis());
            }
            Ok(Some(ReaderEvent::Notice(notice))) => println!("{notice}"),
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
    script.await?;

    // Manual entry goes through the same validator as the scans above.
    let manual = reader.submit_manual_identifier("04-5a-2e-92-f1").await?;
    println!("manual: {}", manual.uid);

    if let Err(e) = reader.submit_manual_identifier("not-a-uid").await {
        println!("rejected: {e}");
    }

    reader.deactivate().await;
    info!(status = %reader.current_status(), "session ended");
    Ok(())
}
