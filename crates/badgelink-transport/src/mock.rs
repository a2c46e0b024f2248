//! Mock serial transport for testing and development.
//!
//! This module provides a simulated serial-attached card reader that can
//! be controlled programmatically without physical hardware. The
//! [`MockSerial`] transport is handed to the reader core; the paired
//! [`MockSerialHandle`] plays the role of the device on the other end of
//! the line.

use crate::{
    Result, TransportError,
    traits::{SerialPort, SerialTransport},
    types::{DeviceSelector, LinkParams},
};
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Default vendor ID reported by the mock device (ACS, ACR122U family).
pub const MOCK_VENDOR_ID: u16 = 0x072F;

/// Capacity of the mock device-to-port chunk channel.
const CHUNK_CHANNEL_CAPACITY: usize = 32;

/// What the fake device puts on the line next.
#[derive(Debug)]
enum PortFrame {
    /// Raw bytes delivered as one chunk.
    Chunk(Bytes),

    /// Simulated mid-session stream fault.
    ReadError(String),
}

/// State shared between transport, open port, and control handle.
#[derive(Debug)]
struct MockShared {
    /// Host capability flag probed by `is_available`.
    available: bool,

    /// Vendor ID the mock device advertises to selectors.
    vendor_id: u16,

    /// When set, the next open fails with this message.
    fail_next_open: Option<String>,

    /// Sender feeding the currently open port, if any.
    port_tx: Option<mpsc::Sender<PortFrame>>,

    /// Number of successful opens.
    open_count: usize,

    /// Number of local closes.
    close_count: usize,

    /// Link parameters from the most recent open.
    last_params: Option<LinkParams>,
}

fn lock(shared: &Mutex<MockShared>) -> std::sync::MutexGuard<'_, MockShared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock serial transport.
///
/// Implements [`SerialTransport`] against in-memory channels. At most one
/// port is open at a time, mirroring exclusive device ownership on a real
/// host.
///
/// # Examples
///
/// ```
/// use badgelink_transport::mock::MockSerial;
/// use badgelink_transport::traits::{SerialPort, SerialTransport};
/// use badgelink_transport::types::{DeviceSelector, LinkParams};
///
/// #[tokio::main]
/// async fn main() -> badgelink_transport::Result<()> {
///     let (transport, device) = MockSerial::new();
///     assert!(transport.is_available());
///
///     let mut port = transport
///         .open(&DeviceSelector::any(), LinkParams::default())
///         .await?;
///
///     device.present_uid("045a2e92").await?;
///     let chunk = port.read_chunk().await?.expect("chunk pending");
///     assert_eq!(&chunk[..], b"045a2e92\r\n");
///
///     port.close().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockSerial {
    shared: Arc<Mutex<MockShared>>,
}

impl MockSerial {
    /// Create a new mock transport with its control handle.
    pub fn new() -> (Self, MockSerialHandle) {
        Self::with_vendor_id(MOCK_VENDOR_ID)
    }

    /// Create a mock transport whose device advertises a custom vendor ID.
    pub fn with_vendor_id(vendor_id: u16) -> (Self, MockSerialHandle) {
        let shared = Arc::new(Mutex::new(MockShared {
            available: true,
            vendor_id,
            fail_next_open: None,
            port_tx: None,
            open_count: 0,
            close_count: 0,
            last_params: None,
        }));

        let transport = Self {
            shared: Arc::clone(&shared),
        };
        let handle = MockSerialHandle { shared };

        (transport, handle)
    }
}

impl SerialTransport for MockSerial {
    type Port = MockSerialPort;

    fn is_available(&self) -> bool {
        lock(&self.shared).available
    }

    async fn open(&self, selector: &DeviceSelector, params: LinkParams) -> Result<Self::Port> {
        let mut shared = lock(&self.shared);

        if !shared.available {
            return Err(TransportError::unavailable(
                "mock host has serial support disabled",
            ));
        }

        if let Some(message) = shared.fail_next_open.take() {
            return Err(TransportError::open_failed(message));
        }

        if !selector.matches(shared.vendor_id) {
            return Err(TransportError::open_failed(format!(
                "no device matched selector (mock vendor {:04X})",
                shared.vendor_id
            )));
        }

        if shared.port_tx.is_some() {
            return Err(TransportError::open_failed("mock port already open"));
        }

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        shared.port_tx = Some(tx);
        shared.open_count += 1;
        shared.last_params = Some(params);

        Ok(MockSerialPort {
            rx,
            shared: Arc::clone(&self.shared),
            closed: false,
        })
    }
}

/// An open mock port.
///
/// Obtained from [`MockSerial::open`]; yields whatever the paired
/// [`MockSerialHandle`] puts on the line.
#[derive(Debug)]
pub struct MockSerialPort {
    rx: mpsc::Receiver<PortFrame>,
    shared: Arc<Mutex<MockShared>>,
    closed: bool,
}

impl SerialPort for MockSerialPort {
    async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.closed {
            return Err(TransportError::closed("mock"));
        }

        match self.rx.recv().await {
            Some(PortFrame::Chunk(bytes)) => Ok(Some(bytes)),
            Some(PortFrame::ReadError(message)) => Err(TransportError::read_failed(message)),
            // Device side dropped the line: clean end of stream
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            let mut shared = lock(&self.shared);
            shared.port_tx = None;
            shared.close_count += 1;
        }
        Ok(())
    }
}

/// Handle for controlling a mock serial device.
///
/// The handle is the device side of the line: it presents card reads,
/// injects faults, and toggles host capability. Cloneable so tests can
/// script the device from spawned tasks.
///
/// # Examples
///
/// ```
/// use badgelink_transport::mock::MockSerial;
/// use badgelink_transport::traits::{SerialPort, SerialTransport};
/// use badgelink_transport::types::{DeviceSelector, LinkParams};
///
/// #[tokio::main]
/// async fn main() -> badgelink_transport::Result<()> {
///     let (transport, device) = MockSerial::new();
///     let mut port = transport
///         .open(&DeviceSelector::any(), LinkParams::default())
///         .await?;
///
///     // One physical card read arrives as one chunk
///     device.present_uid("04ab11cc").await?;
///
///     // Peer closes the stream cleanly
///     device.close_stream();
///
///     assert!(port.read_chunk().await?.is_some());
///     assert!(port.read_chunk().await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockSerialHandle {
    shared: Arc<Mutex<MockShared>>,
}

impl MockSerialHandle {
    /// Toggle the host capability flag probed by `is_available`.
    pub fn set_available(&self, available: bool) {
        lock(&self.shared).available = available;
    }

    /// Make the next open attempt fail with the given message.
    pub fn fail_next_open(&self, message: impl Into<String>) {
        lock(&self.shared).fail_next_open = Some(message.into());
    }

    /// Deliver one raw chunk to the open port.
    ///
    /// # Errors
    ///
    /// Returns an error if no port is open or the port was dropped.
    pub async fn send_chunk(&self, chunk: impl Into<Bytes>) -> Result<()> {
        self.send_frame(PortFrame::Chunk(chunk.into())).await
    }

    /// Deliver one card read the way a line-mode reader does: the UID
    /// followed by CRLF, in a single chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if no port is open or the port was dropped.
    pub async fn present_uid(&self, uid: &str) -> Result<()> {
        self.send_chunk(format!("{uid}\r\n").into_bytes()).await
    }

    /// Inject a mid-session read fault.
    ///
    /// The open port's next `read_chunk` returns a read error.
    ///
    /// # Errors
    ///
    /// Returns an error if no port is open or the port was dropped.
    pub async fn fail_read(&self, message: impl Into<String>) -> Result<()> {
        self.send_frame(PortFrame::ReadError(message.into())).await
    }

    /// Close the stream from the device side.
    ///
    /// The open port's next `read_chunk` observes a clean end of stream.
    pub fn close_stream(&self) {
        lock(&self.shared).port_tx = None;
    }

    /// Check whether a port is currently open.
    pub fn is_open(&self) -> bool {
        lock(&self.shared).port_tx.is_some()
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> usize {
        lock(&self.shared).open_count
    }

    /// Number of local closes so far.
    pub fn close_count(&self) -> usize {
        lock(&self.shared).close_count
    }

    /// Link parameters from the most recent open, if any.
    pub fn last_params(&self) -> Option<LinkParams> {
        lock(&self.shared).last_params
    }

    async fn send_frame(&self, frame: PortFrame) -> Result<()> {
        let tx = lock(&self.shared)
            .port_tx
            .clone()
            .ok_or_else(|| TransportError::closed("no open mock port"))?;

        tx.send(frame)
            .await
            .map_err(|_| TransportError::closed("mock port dropped"))
    }
}
