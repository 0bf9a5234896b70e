//! Error Types for Classification and Analysis
//!
//! ## Error Categories
//!
//! ### Scale Errors
//! Raised while building a severity scale or looking a label up in one:
//! - `LabelNotFound`: reverse lookup with a label the scale does not define.
//!   This is a caller bug; a wrong threshold would silently move an alarm
//!   cutoff, so it is never defaulted.
//! - `EmptyScale`, `NonIncreasingBound`, `InvalidBound`, `DuplicateLabel`,
//!   `EmptyLabel`, `LabelTooLong`, `SentinelCollision`: a configured scale
//!   broke one of the table invariants.
//!
//! Note that a measurement above every bound is *not* an error: `classify`
//! resolves it to the out-of-range sentinel.
//!
//! ### Analysis Errors
//! Raised by the histogram and spectrum builders when their input cannot
//! produce meaningful output.
//!
//! ### Channel Errors
//! Raised while turning a beamline/variable selection into PV names.
//!
//! ## Handling
//!
//! ```rust
//! use vibguard_core::{ScaleError, SeverityScale};
//!
//! let scale = SeverityScale::iest_rp_cc012();
//! match scale.threshold("g") {
//!     Ok(limit) => println!("alarm above {limit} m/s"),
//!     Err(ScaleError::LabelNotFound { label }) => {
//!         eprintln!("unknown VC level {label:?}");
//!     }
//!     Err(other) => eprintln!("{other}"),
//! }
//! ```

use alloc::string::String;
use thiserror_no_std::Error;

/// Result type for scale operations
pub type ScaleResult<T> = Result<T, ScaleError>;

/// Result type for histogram and spectrum operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors raised by [`SeverityScale`](crate::scale::SeverityScale)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    /// Reverse lookup with a label that is not part of the scale
    #[error("VC label {label:?} not found in severity scale")]
    LabelNotFound {
        /// The label that was requested
        label: String,
    },

    /// A scale needs at least one bound
    #[error("Severity scale has no entries")]
    EmptyScale,

    /// Bounds must be strictly increasing
    #[error("Bound {bound} at position {index} does not exceed previous bound {previous}")]
    NonIncreasingBound {
        /// Position of the offending entry
        index: usize,
        /// The offending bound
        bound: f64,
        /// Bound of the entry before it
        previous: f64,
    },

    /// Bounds must be finite and non-negative
    #[error("Bound {bound} at position {index} is not a finite non-negative velocity")]
    InvalidBound {
        /// Position of the offending entry
        index: usize,
        /// The offending bound
        bound: f64,
    },

    /// Each label may appear once
    #[error("Label {label:?} appears more than once")]
    DuplicateLabel {
        /// The repeated label
        label: String,
    },

    /// Labels must not be empty
    #[error("Empty label at position {index}")]
    EmptyLabel {
        /// Position of the offending entry
        index: usize,
    },

    /// Labels are stored inline and have a fixed capacity
    #[error("Label {label:?} is longer than {max} bytes")]
    LabelTooLong {
        /// The label that did not fit
        label: String,
        /// Inline label capacity
        max: usize,
    },

    /// The out-of-range sentinel must differ from every scale label
    #[error("Out-of-range label {label:?} collides with a scale label")]
    SentinelCollision {
        /// The colliding label
        label: String,
    },
}

/// Errors raised by histogram and spectrum builders
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Nothing to analyse
    #[error("No samples to analyse")]
    EmptyInput,

    /// Every FFT frame of a series must have the same number of bins
    #[error("Spectrum frame {index} has {found} bins, expected {expected}")]
    RaggedSpectrum {
        /// Position of the offending frame
        index: usize,
        /// Bin count of the first frame
        expected: usize,
        /// Bin count of the offending frame
        found: usize,
    },

    /// Frequency range empty or outside the frame
    #[error("Frequency range {start}..{end} invalid for {bins} bins")]
    InvalidFrequencyRange {
        /// First bin (inclusive)
        start: usize,
        /// Last bin (exclusive)
        end: usize,
        /// Bins available per frame
        bins: usize,
    },

    /// Histogram needs at least one bin over a positive, non-empty range
    #[error("Invalid histogram binning: {reason}")]
    InvalidBinning {
        /// What was wrong with the request
        reason: &'static str,
    },
}

/// Errors raised while building PV names
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// Only `i`, `j` and `k` beamlines follow the canonical naming scheme
    #[error("Unsupported beamline {beamline:?}")]
    UnsupportedBeamline {
        /// The beamline as given
        beamline: String,
    },

    /// Variable not served by the vibration IOC
    #[error("Unsupported variable {variable:?} (expected VC_PEAK or FFT)")]
    UnsupportedVariable {
        /// The variable as given
        variable: String,
    },
}
