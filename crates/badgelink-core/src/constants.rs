//! Core constants for the badgelink reader adapter.
//!
//! This module defines the format limits shared by every component that
//! touches card identifiers. Both the automatic decode path and manual
//! operator entry validate against the same values, which is what guarantees
//! that identifiers produced by either path are shaped identically.

// ============================================================================
// Identifier Format Constraints
// ============================================================================

/// Minimum canonical UID length (hex characters).
///
/// Identifiers shorter than this after stripping non-hex characters are
/// rejected. This also doubles as the minimum trimmed length for a raw
/// chunk to be treated as a candidate frame by the decoder.
///
/// # Value: 8 characters
pub const MIN_UID_LENGTH: usize = 8;

/// Maximum canonical UID length (hex characters).
///
/// Identifiers longer than this after stripping non-hex characters are
/// rejected.
///
/// # Value: 16 characters
pub const MAX_UID_LENGTH: usize = 16;

// ============================================================================
// Event Delivery
// ============================================================================

/// Capacity of the reader event channel.
///
/// Bounds the number of undelivered scan events and notices. A slow
/// consumer backpressures the read loop rather than growing memory.
///
/// # Value: 32 events
pub const EVENT_CHANNEL_CAPACITY: usize = 32;
