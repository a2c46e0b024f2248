//! Connection lifecycle and stream decoding for serial-attached
//! identity-card readers.
//!
//! This crate is the core of the badgelink adapter. It owns three
//! concerns:
//!
//! - **Connection management** ([`ReaderManager`]): an explicit state
//!   machine over [`ReaderStatus`] mediating activation, connection, and
//!   teardown of the physical link.
//! - **Frame decoding** ([`decode_frame`] and the internal read loop): a
//!   cancellable cooperative task turning raw chunks into validated scan
//!   events.
//! - **Event delivery** ([`EventStream`]): a single channel carrying scan
//!   events and `(severity, message)` notices to the caller.
//!
//! Identifier validation itself lives in `badgelink-core` and is shared
//! byte-for-byte between the automatic and manual entry paths.
//!
//! # Quick Start
//!
//! ```no_run
//! use badgelink_reader::{ReaderEvent, ReaderManager};
//! use badgelink_transport::mock::MockSerial;
//! use badgelink_transport::types::DeviceSelector;
//!
//! #[tokio::main]
//! async fn main() -> badgelink_core::Result<()> {
//!     let (transport, device) = MockSerial::new();
//!     let (mut reader, mut events) = ReaderManager::new(transport);
//!
//!     reader.activate().await?;
//!     reader.connect(&DeviceSelector::any()).await?;
//!
//!     device.present_uid("045a2e92").await.ok();
//!
//!     if let Some(ReaderEvent::Scan(scan)) = events.recv().await {
//!         println!("card {} via {}", scan.uid, scan.source);
//!     }
//!
//!     reader.disconnect().await?;
//!     reader.deactivate().await;
//!     Ok(())
//! }
//! ```

pub mod decoder;
pub mod events;
pub mod manager;
pub mod status;

// Re-export commonly used types for convenience
pub use decoder::decode_frame;
pub use events::{EventStream, ReaderEvent};
pub use manager::ReaderManager;
pub use status::ReaderStatus;
