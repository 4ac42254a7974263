//! Millisecond-precision instants
//!
//! A `Date` is a signed count of milliseconds since the Unix epoch
//! (1970-01-01T00:00:00Z). Negative values are instants before the epoch.
//!
//! ## Textual form
//!
//! RFC 3339 in UTC with exactly three fractional digits:
//!
//! ```
//! use mixcell_core::Date;
//!
//! let d = Date::from_millis(1_614_600_000_000);
//! assert_eq!(d.to_string(), "2021-03-01T12:00:00.000Z");
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Millisecond-precision instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date(i64);

impl Date {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Date = Date(0);

    // =========================================================================
    // Constructors
    // =========================================================================

    /// The current instant, truncated to milliseconds
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Date(d.as_millis() as i64),
            Err(e) => Date(-(e.duration().as_millis() as i64)),
        }
    }

    /// Create from milliseconds since epoch
    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Date(millis)
    }

    /// Parse an RFC 3339 timestamp; sub-millisecond digits are truncated
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Date(dt.timestamp_millis()))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Milliseconds since Unix epoch
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// As a chrono UTC datetime, if inside chrono's supported range
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
    }

    /// Add a duration, saturating at the representable range
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Date(self.0.saturating_add(duration.as_millis() as i64))
    }
}

impl Default for Date {
    fn default() -> Self {
        Date::EPOCH
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            // Outside chrono's range (about ±262,000 years): keep it lossless.
            None => write!(f, "Date({}ms)", self.0),
        }
    }
}

// ============================================================================
// From Implementations
// ============================================================================

impl From<DateTime<Utc>> for Date {
    fn from(dt: DateTime<Utc>) -> Self {
        Date(dt.timestamp_millis())
    }
}

impl From<SystemTime> for Date {
    fn from(t: SystemTime) -> Self {
        DateTime::<Utc>::from(t).into()
    }
}

impl From<Date> for i64 {
    fn from(d: Date) -> Self {
        d.0
    }
}
