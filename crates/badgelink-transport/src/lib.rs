//! Serial transport abstraction for the badgelink reader adapter.
//!
//! This crate defines the contract between the reader core and the host's
//! serial-stream capability. The reader never talks to hardware directly:
//! it is handed an implementation of [`SerialTransport`], asks it whether
//! the host is capable at all, and opens ports through it. This keeps the
//! connection state machine testable without physical hardware and keeps
//! device discovery policy out of the core.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native
//!   `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Capability-probed**: Hosts without serial support are detected up
//!   front via [`SerialTransport::is_available`], not by a failing open.
//! - **Chunked reads**: The readable side yields transport-sized chunks;
//!   framing is the consumer's concern.
//! - **Error-aware**: All operations return `Result<T>` with detailed
//!   error information.
//!
//! # Mock Implementation
//!
//! The [`mock`] module provides an in-memory transport driven by a control
//! handle, used by the reader's tests and by the demo binary:
//!
//! ```no_run
//! use badgelink_transport::mock::MockSerial;
//! use badgelink_transport::traits::{SerialPort, SerialTransport};
//! use badgelink_transport::types::{DeviceSelector, LinkParams};
//!
//! # async fn example() -> badgelink_transport::Result<()> {
//! let (transport, device) = MockSerial::new();
//!
//! let mut port = transport
//!     .open(&DeviceSelector::any(), LinkParams::default())
//!     .await?;
//!
//! device.present_uid("045a2e92").await?;
//! let chunk = port.read_chunk().await?;
//! assert!(chunk.is_some());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{Result, TransportError};
pub use traits::{SerialPort, SerialTransport};
pub use types::{DeviceSelector, FlowControl, LinkParams, Parity};
