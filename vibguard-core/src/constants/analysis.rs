//! Analysis Parameters
//!
//! Defaults for the histogram and spectrum builders.

/// Default frequency window for spectrograms (bins, 1 Hz each).
///
/// Below 2 Hz the accelerometers are dominated by drift; above 400 Hz
/// the archived FFT carries little useful energy.
pub const DEFAULT_FREQ_RANGE: core::ops::Range<usize> = 2..400;

/// Width of one archived FFT bin (Hz).
pub const FFT_BIN_WIDTH_HZ: f64 = 1.0;

/// Floor applied to non-positive spectral power before conversion to dB.
pub const DB_FLOOR: f64 = -300.0;

/// Default number of logarithmic histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;
