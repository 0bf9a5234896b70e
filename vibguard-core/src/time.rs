//! Time handling for archived samples
//!
//! Archive timestamps are carried as milliseconds since the Unix epoch.
//! Wall-clock conversion (RFC 3339, time zones) happens at the edges, in
//! the connectors and the CLI.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::time::{MS_PER_SECOND, NS_PER_MS};

/// Timestamp in milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Half-open time window `[start_ms, end_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeWindow {
    /// First millisecond inside the window
    pub start_ms: Timestamp,
    /// First millisecond after the window
    pub end_ms: Timestamp,
}

impl TimeWindow {
    /// Create a window; bounds are swapped if given in reverse
    pub fn new(start_ms: Timestamp, end_ms: Timestamp) -> Self {
        let (start_ms, end_ms) = if start_ms > end_ms { (end_ms, start_ms) } else { (start_ms, end_ms) };
        Self { start_ms, end_ms }
    }

    /// Window ending at `end_ms` and spanning `duration_ms` before it
    pub fn ending_at(end_ms: Timestamp, duration_ms: u64) -> Self {
        Self::new(end_ms.saturating_sub(duration_ms), end_ms)
    }

    /// True if `timestamp` falls inside the window
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        timestamp >= self.start_ms && timestamp < self.end_ms
    }

    /// Window length in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Convert archive `(secs, nanos)` into a millisecond timestamp.
///
/// Pre-epoch times clamp to 0.
pub fn timestamp_from_parts(secs: i64, nanos: u32) -> Timestamp {
    if secs < 0 {
        return 0;
    }
    (secs as u64)
        .saturating_mul(MS_PER_SECOND)
        .saturating_add(nanos as u64 / NS_PER_MS)
}

/// Seconds represented by a millisecond duration
pub fn ms_to_seconds(ms: u64) -> f64 {
    ms as f64 / MS_PER_SECOND as f64
}
