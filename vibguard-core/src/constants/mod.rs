//! Constants for vibguard Core
//!
//! Centralised, documented constants used throughout the crate. Numeric
//! values carry their unit in the name.
//!
//! ## Organization
//!
//! - **VC**: the IEST-RP-CC012 vibration criterion table and labels
//! - **Channels**: PV naming for the accelerometer IOCs
//! - **Analysis**: histogram and spectrum defaults
//! - **Time**: conversions and default windows

/// Vibration criterion curves and labels.
pub mod vc;

/// PV naming defaults.
pub mod channels;

/// Histogram and spectrum defaults.
pub mod analysis;

/// Time conversions and default windows.
pub mod time;

pub use vc::{
    IEST_RP_CC012, OUT_OF_RANGE_LABEL, MAX_LABEL_LEN,
    DEFAULT_ALARM_LABEL, DEFAULT_REFERENCE_RANGE,
};

pub use channels::{
    DEFAULT_PV_TEMPLATE, DEFAULT_BEAMLINE, BEAMLINE_ENV_VAR,
    DEFAULT_KIT_ID, DEFAULT_CHANNEL,
};

pub use analysis::{DEFAULT_FREQ_RANGE, DB_FLOOR, DEFAULT_HISTOGRAM_BINS};

pub use time::{
    MS_PER_SECOND, MS_PER_HOUR, DEFAULT_LOOKBACK_HOURS, DEFAULT_ALARM_MERGE_GAP_MS,
};
