//! Configuration types for serial transports.

use serde::{Deserialize, Serialize};

/// Default baud rate for identity-card readers.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Parity bit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Flow control configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

/// Serial link parameters.
///
/// Card readers in this adapter's family all speak the same fixed line
/// settings; [`LinkParams::default`] returns them. The struct exists so a
/// transport backend receives explicit settings rather than assumptions.
///
/// # Examples
///
/// ```
/// use badgelink_transport::types::LinkParams;
///
/// let params = LinkParams::default();
/// assert_eq!(params.baud_rate, 9600);
/// assert_eq!(params.data_bits, 8);
/// assert_eq!(params.stop_bits, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkParams {
    /// Symbols per second on the line.
    pub baud_rate: u32,

    /// Data bits per character.
    pub data_bits: u8,

    /// Parity bit mode.
    pub parity: Parity,

    /// Stop bits per character.
    pub stop_bits: u8,

    /// Flow control mode.
    pub flow_control: FlowControl,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
        }
    }
}

/// Device selector used when requesting a port from the host.
///
/// The selector is an allow-list of USB vendor identifiers. It is treated
/// as opaque configuration by the reader core: the transport backend
/// decides how to match it against the devices the host exposes.
///
/// # Examples
///
/// ```
/// use badgelink_transport::types::DeviceSelector;
///
/// // Accept any device the host offers
/// let any = DeviceSelector::any();
/// assert!(any.matches(0x072F));
///
/// // Accept only a known reader vendor
/// let acs = DeviceSelector::any().allow_vendor(0x072F);
/// assert!(acs.matches(0x072F));
/// assert!(!acs.matches(0x1234));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelector {
    /// Allowed USB vendor IDs. Empty means every device matches.
    pub allowed_vendors: Vec<u16>,
}

impl DeviceSelector {
    /// Create a selector that matches every device.
    pub fn any() -> Self {
        Self::default()
    }

    /// Add a vendor ID to the allow-list.
    #[must_use]
    pub fn allow_vendor(mut self, vendor_id: u16) -> Self {
        self.allowed_vendors.push(vendor_id);
        self
    }

    /// Check whether a device with the given vendor ID matches.
    #[must_use]
    pub fn matches(&self, vendor_id: u16) -> bool {
        self.allowed_vendors.is_empty() || self.allowed_vendors.contains(&vendor_id)
    }
}
