//! Archive Connectors for vibguard
//!
//! ## Overview
//!
//! Vibration data lives in a time-series archive keyed by PV name. This
//! crate retrieves `(timestamp, value)` histories for a PV over a time
//! window and hands them to `vibguard-core` as series.
//!
//! ### Archiver Appliance (HTTP)
//!
//! **When to use:** live facility data.
//!
//! - JSON retrieval endpoint (`/retrieval/data/getData.json`)
//! - One request per PV; several PVs are fetched concurrently
//! - Retries with exponential backoff on transport errors, 5xx and 429
//!
//! ### Memory / saved dumps
//!
//! **When to use:** offline analysis and tests.
//!
//! - Holds records per PV in memory
//! - Loads a saved `getData.json` response (array of PV payloads)
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use vibguard_connectors::{fetch_series, archiver::{ArchiverClient, ArchiverConfig}};
//! use vibguard_core::TimeWindow;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ArchiverClient::new(
//!     ArchiverConfig::new("http://archappl.diamond.ac.uk").timeout_secs(60),
//! )?);
//!
//! let pvs = vec!["BL20I-DI-ACCEL-01:DATA:CH01:VC_PEAK".to_string()];
//! let window = TimeWindow::new(1_651_536_000_000, 1_651_708_800_000);
//! let series = fetch_series(client, &pvs, window).await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "http")]
pub mod archiver;

pub mod fetch;
pub mod memory;
pub mod wire;

pub use fetch::{fetch_channels, fetch_series, fetch_spectra, to_channel_series, to_spectrum_series};
pub use memory::MemorySource;

use thiserror::Error;
use vibguard_core::{TimeWindow, Timestamp};

/// Archive connector errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Server returned error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Response body was not the expected JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// PV not held by the source
    #[error("PV {pv} not available from {source_name}")]
    UnknownPv { pv: String, source_name: String },

    /// Background fetch task panicked or was cancelled
    #[error("Fetch task failed: {0}")]
    Task(String),

    /// Reading a saved dump failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Value archived for one update of a PV
#[derive(Debug, Clone, PartialEq)]
pub enum ArchivedValue {
    /// Scalar PV (e.g. VC peak velocity)
    Scalar(f64),
    /// Waveform PV (e.g. FFT)
    Waveform(Vec<f64>),
}

/// One archived update
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRecord {
    /// Update time (ms since epoch)
    pub timestamp_ms: Timestamp,
    /// Archived value
    pub value: ArchivedValue,
}

impl ArchiveRecord {
    /// Scalar record
    pub fn scalar(timestamp_ms: Timestamp, value: f64) -> Self {
        Self { timestamp_ms, value: ArchivedValue::Scalar(value) }
    }

    /// Waveform record
    pub fn waveform(timestamp_ms: Timestamp, bins: Vec<f64>) -> Self {
        Self { timestamp_ms, value: ArchivedValue::Waveform(bins) }
    }
}

/// Source of archived PV histories.
///
/// Implementations must be shareable across tasks; one source serves every
/// PV of a request.
#[async_trait::async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Records of `pv` with timestamps inside `window`, oldest first
    async fn fetch(&self, pv: &str, window: TimeWindow) -> Result<Vec<ArchiveRecord>, ArchiveError>;

    /// Short description for logs
    fn describe(&self) -> String;

    /// Get connection statistics
    fn stats(&self) -> ConnectionStats;
}

/// Connection statistics common to all sources
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Requests answered successfully
    pub requests_ok: u64,
    /// Requests that failed after retries
    pub requests_failed: u64,
    /// Retries performed
    pub retries: u64,
    /// Response bytes received
    pub bytes_received: u64,
    /// Records returned to callers
    pub records_returned: u64,
    /// Last error message
    pub last_error: Option<String>,
}
