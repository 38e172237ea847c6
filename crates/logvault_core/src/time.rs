//! Wall clock timestamps.
//!
//! Used for file modification times in listings and for the emission time of
//! stream events. Always rendered as ISO-8601 in UTC.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall clock timestamp with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timestamp {
    /// Seconds since the Unix epoch
    pub seconds: u64,
    /// Sub-second nanoseconds
    pub nanos: u32,
}

impl Timestamp {
    /// Maximum nanoseconds per second
    pub const NANOS_PER_SEC: u32 = 1_000_000_000;

    /// Create a new timestamp
    #[must_use]
    pub fn new(seconds: u64, nanos: u32) -> Self {
        Self {
            seconds: seconds + u64::from(nanos / Self::NANOS_PER_SEC),
            nanos: nanos % Self::NANOS_PER_SEC,
        }
    }

    /// Current wall clock time
    #[must_use]
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert a filesystem time; times before the epoch clamp to zero
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self {
            seconds: duration.as_secs(),
            nanos: duration.subsec_nanos(),
        }
    }

    /// As a chrono UTC datetime
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        i64::try_from(self.seconds)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, self.nanos))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// ISO-8601 rendering with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.to_datetime()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_iso8601())
    }
}
