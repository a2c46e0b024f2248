//! Serial transport trait definitions.
//!
//! These traits establish the contract between the reader core and the
//! host's serial capability. The core consumes them generically, which
//! allows substitution between the in-memory mock (development, tests)
//! and real hardware backends behind the `hardware-*` feature flags.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceSelector, LinkParams};
use bytes::Bytes;

/// Host serial capability and port factory.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods
/// return `impl Future` (Edition 2024 RPITIT). Consume it through generic
/// type parameters:
///
/// ```no_run
/// use badgelink_transport::traits::{SerialPort, SerialTransport};
/// use badgelink_transport::types::{DeviceSelector, LinkParams};
/// use badgelink_transport::error::Result;
///
/// async fn open_reader<T: SerialTransport>(transport: &T) -> Result<T::Port> {
///     transport
///         .open(&DeviceSelector::any(), LinkParams::default())
///         .await
/// }
/// ```
pub trait SerialTransport: Send + Sync {
    /// The port type produced by a successful open.
    type Port: SerialPort;

    /// Check whether this host exposes serial-stream support at all.
    ///
    /// A `false` here is terminal for the current host: retrying will not
    /// help until the process runs somewhere capable.
    fn is_available(&self) -> bool;

    /// Request and open a port matching the selector.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The host lacks serial capability
    /// - No device matches the selector
    /// - The device refuses to open with the given link parameters
    async fn open(&self, selector: &DeviceSelector, params: LinkParams) -> Result<Self::Port>;
}

/// An open serial port's readable side.
///
/// The port is exclusively owned by whoever opened it. Reads have no
/// timeout: `read_chunk` parks until data, end of stream, or an error.
/// Callers that need to abandon a read race it against a cancellation
/// signal; dropping or closing the port afterwards releases the device.
pub trait SerialPort: Send + 'static {
    /// Await the next chunk from the device.
    ///
    /// Returns `Ok(Some(bytes))` for data, `Ok(None)` once the peer has
    /// cleanly closed the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream fails mid-session (device removed,
    /// line fault) or the port was already closed locally.
    fn read_chunk(&mut self) -> impl core::future::Future<Output = Result<Option<Bytes>>> + Send;

    /// Close the port and release the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying handle fails to close; callers
    /// treat teardown as best-effort.
    fn close(&mut self) -> impl core::future::Future<Output = Result<()>> + Send;
}
