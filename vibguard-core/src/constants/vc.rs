//! Vibration Criterion (VC) Curves
//!
//! Upper limits of the generic vibration criteria, expressed as the peak
//! 1/3-octave band velocity in m/s, following IEST-RP-CC012. The original
//! paper (with older values) is:
//!
//! Colin G. Gordon, "Generic vibration criteria for vibration-sensitive
//! equipment," Proc. SPIE 3786 (1999), <https://doi.org/10.1117/12.363802>
//!
//! The relaxation IEST allows below 8 Hz for VC-A and VC-B is not applied,
//! so classification on those levels is conservative.

/// Label capacity for scale labels (bytes).
///
/// Fits the single-letter VC grades, "ISO" and short custom names.
pub const MAX_LABEL_LEN: usize = 8;

/// Label returned for velocities above the loosest VC curve (50 µm/s).
pub const OUT_OF_RANGE_LABEL: &str = "ISO";

/// Standard VC table as `(upper bound in m/s, label)` pairs.
///
/// Ordered by ascending bound: the smallest bound carries the most
/// stringent grade (VC-M), the largest the loosest (VC-A).
pub const IEST_RP_CC012: [(f64, &str); 13] = [
    (0.012e-6, "M"),
    (0.024e-6, "L"),
    (0.048e-6, "K"),
    (0.097e-6, "J"),
    (0.195e-6, "I"),
    (0.39e-6, "H"),
    (0.78e-6, "G"),
    (1.56e-6, "F"),
    (3.12e-6, "E"),
    (6.25e-6, "D"),
    (12.5e-6, "C"),
    (25e-6, "B"),
    (50e-6, "A"),
];

/// VC level used for alarms when none is configured.
///
/// Samples at or above the VC-G limit (0.78 µm/s) raise an alarm.
pub const DEFAULT_ALARM_LABEL: &str = "G";

/// Scale positions of the reference gridlines drawn on time-series views
/// (VC-J through VC-D).
pub const DEFAULT_REFERENCE_RANGE: core::ops::Range<usize> = 3..10;
