//! Time-Related Constants
//!
//! Conversion factors and default windows used when fetching and
//! summarising archived vibration data.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Nanoseconds per millisecond.
pub const NS_PER_MS: u64 = 1_000_000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Minutes per hour.
pub const MINUTES_PER_HOUR: u32 = 60;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: u64 = MS_PER_SECOND * SECONDS_PER_MINUTE as u64;

/// Milliseconds per hour.
pub const MS_PER_HOUR: u64 = MS_PER_MINUTE * MINUTES_PER_HOUR as u64;

// ===== DEFAULT WINDOWS =====

/// Default look-back window for archive queries (hours).
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;

/// Default gap below which consecutive alarm samples merge into one
/// alarm event (milliseconds).
///
/// The VC peak PVs are archived roughly once per second; a minute of
/// quiet ends an event.
pub const DEFAULT_ALARM_MERGE_GAP_MS: u64 = MS_PER_MINUTE;
