use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card identifier (canonical uppercase hex, 8-16 characters)
///
/// A `CardUid` uniquely names a physical identity card. The canonical form
/// is uppercase hexadecimal with every separator and noise character
/// removed, so UIDs read from the wire, typed by an operator, or loaded
/// from configuration always compare equal when they name the same card.
///
/// # Invariant
///
/// Every constructed value matches `^[0-9A-F]{8,16}$`. There is no way to
/// obtain a `CardUid` that violates this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardUid(String);

impl CardUid {
    /// Create a card UID from text that is already canonical.
    ///
    /// Unlike [`CardUid::extract`], this does not strip anything: the input
    /// must consist solely of hex digits. Lowercase input is accepted and
    /// uppercased.
    ///
    /// # Errors
    /// Returns `Error::InvalidUidFormat` if the input contains non-hex
    /// characters or its length is outside 8-16.
    pub fn new(uid: &str) -> Result<Self> {
        if !uid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidUidFormat(format!(
                "UID must be hex digits only, got {uid:?}"
            )));
        }
        let len = uid.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidUidFormat(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} hex chars, got {len}"
            )));
        }
        Ok(CardUid(uid.to_ascii_uppercase()))
    }

    /// Extract a canonical UID from arbitrary raw text.
    ///
    /// This is the single validation function behind both the automatic
    /// decode path and manual operator entry:
    ///
    /// 1. Strip every character that is not in `[0-9A-Fa-f]`.
    /// 2. Accept iff the stripped result is 8-16 characters long.
    /// 3. On acceptance, return the stripped text uppercased.
    ///
    /// Returns `None` on rejection. Callers that need an error value (the
    /// manual entry path) use [`CardUid::parse`] instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use badgelink_core::CardUid;
    ///
    /// let uid = CardUid::extract("04:5a:2e:92").unwrap();
    /// assert_eq!(uid.as_str(), "045A2E92");
    ///
    /// // Too few hex digits survive the strip
    /// assert!(CardUid::extract("12").is_none());
    /// ```
    pub fn extract(raw: &str) -> Option<Self> {
        let stripped: String = raw.chars().filter(|c| c.is_ascii_hexdigit()).collect();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&stripped.len()) {
            return None;
        }
        Some(CardUid(stripped.to_ascii_uppercase()))
    }

    /// Extract a canonical UID, reporting rejection as an error.
    ///
    /// Identical acceptance criteria to [`CardUid::extract`]; used by the
    /// manual entry path where a rejected input must be surfaced to the
    /// operator rather than silently dropped.
    ///
    /// # Errors
    /// Returns `Error::InvalidUidFormat` naming the stripped length when
    /// the input does not yield a valid UID.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::extract(raw).ok_or_else(|| {
            let stripped = raw.chars().filter(|c| c.is_ascii_hexdigit()).count();
            Error::InvalidUidFormat(format!(
                "expected {MIN_UID_LENGTH}-{MAX_UID_LENGTH} hex chars, got {stripped}"
            ))
        })
    }

    /// Get the canonical UID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardUid::parse(s)
    }
}

/// Origin of a scan event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanSource {
    /// Decoded from the reader's byte stream.
    Automatic,

    /// Typed by an operator.
    Manual,
}

impl fmt::Display for ScanSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanSource::Automatic => write!(f, "automatic"),
            ScanSource::Manual => write!(f, "manual"),
        }
    }
}

/// A validated identifier observation.
///
/// Produced once per successful decode or accepted manual entry and never
/// mutated afterwards. Both sources go through [`CardUid`] validation, so
/// an event's `uid` always satisfies the canonical format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Canonical card identifier.
    pub uid: CardUid,

    /// When the observation was made.
    pub observed_at: DateTime<Utc>,

    /// Which path produced the observation.
    pub source: ScanSource,
}

impl ScanEvent {
    /// Create a scan event with an explicit timestamp.
    ///
    /// Useful for tests and for replaying recorded sessions.
    pub fn new(uid: CardUid, source: ScanSource, observed_at: DateTime<Utc>) -> Self {
        Self {
            uid,
            observed_at,
            source,
        }
    }

    /// Create an automatic scan event stamped with the current time.
    pub fn automatic(uid: CardUid) -> Self {
        Self::new(uid, ScanSource::Automatic, Utc::now())
    }

    /// Create a manual entry event stamped with the current time.
    pub fn manual(uid: CardUid) -> Self {
        Self::new(uid, ScanSource::Manual, Utc::now())
    }

    /// Observation time as milliseconds since the Unix epoch.
    #[must_use]
    pub fn observed_at_epoch_millis(&self) -> u64 {
        self.observed_at.timestamp_millis().max(0) as u64
    }
}

/// Severity of a reader notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A user-facing notification from the reader adapter.
///
/// Notices are delivered through the same event channel as scan events and
/// carry no presentation logic: how they are rendered (toast, status line,
/// log) is entirely up to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// How the consumer should weight the message.
    pub severity: Severity,

    /// Human-readable description of what happened.
    pub message: String,
}

impl Notice {
    /// Create a notice with explicit severity.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// Create an informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Create a success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    /// Create a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}
