//! Core classification engine for vibguard
//!
//! Classifies archived vibration velocities against the vibration
//! criterion (VC) curves of IEST-RP-CC012 and derives the data behind the
//! usual diagnostic views: alarms, level histograms and spectrograms.
//!
//! Key properties:
//! - The severity scale is an immutable value; every lookup is pure
//! - Classification never fails and never allocates
//! - Works without `std` (needs `alloc`)
//!
//! ```no_run
//! use vibguard_core::{SeverityScale, ChannelSeries, Sample, classify_series};
//!
//! let scale = SeverityScale::iest_rp_cc012();
//! let series = ChannelSeries::new(
//!     "BL20I-DI-ACCEL-01:DATA:CH01:VC_PEAK",
//!     vec![Sample::new(1_651_536_000_000, 0.5e-6)],
//! );
//!
//! for sample in classify_series(&scale, &series).samples {
//!     println!("{} VC-{}", sample.timestamp_ms, sample.level);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod alarms;
pub mod channel;
pub mod constants;
pub mod errors;
pub mod histogram;
pub mod sample;
pub mod scale;
pub mod spectrum;
pub mod time;
pub mod traits;

// Public API
pub use alarms::{detect_alarms, detect_alarms_all, AlarmConfig, AlarmEvent, AlarmReport};
pub use channel::{Beamline, PvNaming, Variable};
pub use errors::{AnalysisError, AnalysisResult, ChannelError, ScaleError, ScaleResult};
pub use histogram::{LevelHistogram, LogHistogram};
pub use sample::{
    classify_series, ChannelSeries, ClassifiedSample, ClassifiedSeries, Sample,
    SpectrumFrame, SpectrumSeries,
};
pub use scale::{Label, ReferenceLine, ScaleConfig, SeverityScale, VcLevel};
pub use spectrum::Spectrogram;
pub use time::{TimeWindow, Timestamp};
pub use traits::Classifier;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
