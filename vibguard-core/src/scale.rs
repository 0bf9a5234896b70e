//! Severity Scale and VC Classification
//!
//! ## Overview
//!
//! A severity scale is an ordered table of `(upper bound, label)` pairs plus
//! an out-of-range sentinel. Classification finds the first bound that the
//! measured velocity does not exceed; the reverse lookup returns the bound
//! of a label.
//!
//! ```text
//! bound (µm/s)  0.012  0.024  0.048  ...  25    50
//! label         M      L      K      ...  B     A     | ISO
//!               ^ most stringent           loosest ^    ^ above every curve
//! ```
//!
//! ## Lookup
//!
//! `classify` bisects the bound table (`partition_point`) for the leftmost
//! insertion point of the value, so a value exactly on a bound belongs to
//! that bound's level:
//!
//! ```rust
//! use vibguard_core::SeverityScale;
//!
//! let scale = SeverityScale::iest_rp_cc012();
//! assert_eq!(scale.classify(0.78e-6).label(), "G");
//! assert_eq!(scale.classify(0.79e-6).label(), "F");
//! assert_eq!(scale.classify(51e-6).label(), "ISO");
//! assert_eq!(scale.threshold("G")?, 0.78e-6);
//! # Ok::<(), vibguard_core::ScaleError>(())
//! ```
//!
//! `classify` never fails. `threshold` fails with
//! [`ScaleError::LabelNotFound`] on any label the scale does not define.
//!
//! ## Custom Scales
//!
//! The standard table is the IEST-RP-CC012 one, but any table satisfying
//! the invariants can be substituted, either in code or from a
//! deserialised [`ScaleConfig`]:
//!
//! - at least one entry
//! - bounds finite, non-negative and strictly increasing
//! - labels non-empty, unique, at most [`MAX_LABEL_LEN`] bytes
//! - sentinel distinct from every label

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::vc::{IEST_RP_CC012, MAX_LABEL_LEN, OUT_OF_RANGE_LABEL};
use crate::errors::{ScaleError, ScaleResult};

/// Inline label storage; classification never allocates
pub type Label = heapless::String<MAX_LABEL_LEN>;

/// Result of classifying one measurement.
///
/// `index` is the scale position: 0 is the most stringent level, and
/// `scale.len()` is the out-of-range sentinel. Levels order by severity
/// first, so sorting a set of levels yields display order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VcLevel {
    index: usize,
    label: Label,
    out_of_range: bool,
}

impl VcLevel {
    /// Scale position (0 = most stringent)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Label text
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// True for the sentinel returned above the last bound
    pub fn is_out_of_range(&self) -> bool {
        self.out_of_range
    }
}

impl fmt::Display for VcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[cfg(feature = "serde")]
impl Serialize for VcLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Gridline for time-series views: a bound and its caption
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ReferenceLine {
    /// Velocity of the line (m/s)
    pub bound: f64,
    /// Caption, e.g. `VC-G`
    pub caption: String,
}

/// Serialisable description of a scale, as read from a scale file.
///
/// ```json
/// { "entries": [ { "upper_bound": 1.0e-6, "label": "X" } ],
///   "out_of_range": "ISO" }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaleConfig {
    /// Entries in ascending bound order
    pub entries: Vec<ScaleEntryConfig>,
    /// Sentinel label (defaults to `ISO`)
    #[cfg_attr(feature = "serde", serde(default = "default_out_of_range"))]
    pub out_of_range: String,
}

/// One entry of a [`ScaleConfig`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaleEntryConfig {
    /// Upper velocity bound (m/s)
    pub upper_bound: f64,
    /// Level label
    pub label: String,
}

#[cfg(feature = "serde")]
fn default_out_of_range() -> String {
    OUT_OF_RANGE_LABEL.to_string()
}

/// Immutable severity table.
///
/// Built once and shared by reference; all lookups are pure.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityScale {
    bounds: Vec<f64>,
    labels: Vec<Label>,
    out_of_range: Label,
}

impl Default for SeverityScale {
    fn default() -> Self {
        Self::iest_rp_cc012()
    }
}

impl SeverityScale {
    /// The IEST-RP-CC012 VC table (VC-M .. VC-A, then `ISO`)
    pub fn iest_rp_cc012() -> Self {
        // Invariants of the constant table are asserted in constants::vc tests
        Self {
            bounds: IEST_RP_CC012.iter().map(|(bound, _)| *bound).collect(),
            labels: IEST_RP_CC012.iter().map(|(_, label)| inline_label(label)).collect(),
            out_of_range: inline_label(OUT_OF_RANGE_LABEL),
        }
    }

    /// Build and validate a scale from `(bound, label)` pairs in ascending
    /// bound order
    pub fn new<I, S>(entries: I, out_of_range: &str) -> ScaleResult<Self>
    where
        I: IntoIterator<Item = (f64, S)>,
        S: AsRef<str>,
    {
        let mut bounds: Vec<f64> = Vec::new();
        let mut labels: Vec<Label> = Vec::new();

        for (index, (bound, label)) in entries.into_iter().enumerate() {
            let label = label.as_ref();

            if !bound.is_finite() || bound < 0.0 {
                return Err(ScaleError::InvalidBound { index, bound });
            }
            if let Some(&previous) = bounds.last() {
                if bound <= previous {
                    return Err(ScaleError::NonIncreasingBound { index, bound, previous });
                }
            }

            let label = checked_label(label, index)?;
            if labels.contains(&label) {
                return Err(ScaleError::DuplicateLabel { label: label.as_str().to_string() });
            }

            bounds.push(bound);
            labels.push(label);
        }

        if bounds.is_empty() {
            return Err(ScaleError::EmptyScale);
        }

        let sentinel = checked_label(out_of_range, bounds.len())?;
        if labels.contains(&sentinel) {
            return Err(ScaleError::SentinelCollision { label: out_of_range.to_string() });
        }

        log_debug!(
            "Severity scale built: {} levels, {} .. {} m/s",
            bounds.len(),
            bounds[0],
            bounds[bounds.len() - 1]
        );

        Ok(Self { bounds, labels, out_of_range: sentinel })
    }

    /// Classify a velocity magnitude (m/s).
    ///
    /// Returns the level of the first bound not exceeded by `value`, or the
    /// out-of-range sentinel above the last bound. NaN resolves to the
    /// sentinel.
    pub fn classify(&self, value: f64) -> VcLevel {
        if value.is_nan() {
            return self.out_of_range_level();
        }

        let index = self.bounds.partition_point(|&bound| bound < value);
        self.level_at(index).unwrap_or_else(|| self.out_of_range_level())
    }

    /// Upper bound (m/s) of `label`.
    ///
    /// The sentinel has no bound and is rejected like any unknown label.
    pub fn threshold(&self, label: &str) -> ScaleResult<f64> {
        self.position(label)
            .map(|index| self.bounds[index])
            .ok_or_else(|| ScaleError::LabelNotFound { label: label.to_string() })
    }

    /// Level for `label`, including the sentinel
    pub fn level_of(&self, label: &str) -> ScaleResult<VcLevel> {
        if label == self.out_of_range.as_str() {
            return Ok(self.out_of_range_level());
        }
        self.position(label)
            .and_then(|index| self.level_at(index))
            .ok_or_else(|| ScaleError::LabelNotFound { label: label.to_string() })
    }

    /// Level at scale position `index`; `None` past the last bound
    pub fn level_at(&self, index: usize) -> Option<VcLevel> {
        self.labels.get(index).map(|label| VcLevel {
            index,
            label: label.clone(),
            out_of_range: false,
        })
    }

    /// The sentinel level
    pub fn out_of_range_level(&self) -> VcLevel {
        VcLevel {
            index: self.labels.len(),
            label: self.out_of_range.clone(),
            out_of_range: true,
        }
    }

    /// Every level in display order, sentinel last
    pub fn levels(&self) -> Vec<VcLevel> {
        (0..self.labels.len())
            .filter_map(|index| self.level_at(index))
            .chain(core::iter::once(self.out_of_range_level()))
            .collect()
    }

    /// `(bound, label)` pairs in ascending bound order
    pub fn entries(&self) -> impl Iterator<Item = (f64, &str)> + '_ {
        self.bounds.iter().copied().zip(self.labels.iter().map(|l| l.as_str()))
    }

    /// Number of bounded levels (the sentinel is not counted)
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Always false for a validated scale
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Sentinel label
    pub fn out_of_range_label(&self) -> &str {
        self.out_of_range.as_str()
    }

    /// Gridlines for scale positions in `range`, clipped to the table
    pub fn reference_lines(&self, range: Range<usize>) -> Vec<ReferenceLine> {
        let end = range.end.min(self.len());
        let start = range.start.min(end);

        self.entries()
            .skip(start)
            .take(end - start)
            .map(|(bound, label)| ReferenceLine {
                bound,
                caption: alloc::format!("VC-{}", label),
            })
            .collect()
    }

    /// Serialisable form of this scale
    pub fn to_config(&self) -> ScaleConfig {
        ScaleConfig {
            entries: self
                .entries()
                .map(|(upper_bound, label)| ScaleEntryConfig {
                    upper_bound,
                    label: label.to_string(),
                })
                .collect(),
            out_of_range: self.out_of_range.as_str().to_string(),
        }
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l.as_str() == label)
    }
}

impl TryFrom<ScaleConfig> for SeverityScale {
    type Error = ScaleError;

    fn try_from(config: ScaleConfig) -> ScaleResult<Self> {
        Self::new(
            config.entries.iter().map(|e| (e.upper_bound, e.label.as_str())),
            &config.out_of_range,
        )
    }
}

fn checked_label(label: &str, index: usize) -> ScaleResult<Label> {
    if label.is_empty() {
        return Err(ScaleError::EmptyLabel { index });
    }
    Label::try_from(label).map_err(|_| ScaleError::LabelTooLong {
        label: label.to_string(),
        max: MAX_LABEL_LEN,
    })
}

fn inline_label(label: &str) -> Label {
    let mut out = Label::new();
    for c in label.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn three_level() -> SeverityScale {
        SeverityScale::new([(0.012e-6, "C"), (0.024e-6, "B"), (0.048e-6, "A")], "ISO").unwrap()
    }

    #[test]
    fn standard_table_passes_validation() {
        let validated = SeverityScale::new(IEST_RP_CC012, OUT_OF_RANGE_LABEL).unwrap();
        assert_eq!(validated, SeverityScale::iest_rp_cc012());
        assert_eq!(validated.len(), 13);
    }

    #[test]
    fn level_display_honours_width() {
        let scale = SeverityScale::iest_rp_cc012();
        assert_eq!(alloc::format!("[{:<5}]", scale.classify(1.0)), "[ISO  ]");
        assert_eq!(alloc::format!("[{:>3}]", scale.classify(0.0)), "[  M]");
    }

    #[test]
    fn classify_three_level_scenario() {
        let scale = three_level();
        assert_eq!(scale.classify(0.012e-6).label(), "C");
        assert_eq!(scale.classify(0.030e-6).label(), "A");
        assert!(scale.classify(0.060e-6).is_out_of_range());
        assert_eq!(scale.classify(0.060e-6).label(), "ISO");
    }

    #[test]
    fn threshold_three_level_scenario() {
        let scale = three_level();
        assert_eq!(scale.threshold("C").unwrap(), 0.012e-6);
        assert_eq!(
            scale.threshold("Z"),
            Err(ScaleError::LabelNotFound { label: "Z".into() })
        );
    }

    #[test]
    fn value_on_bound_takes_that_level() {
        let scale = SeverityScale::iest_rp_cc012();
        for (bound, label) in IEST_RP_CC012 {
            assert_eq!(scale.classify(bound).label(), label);
        }
    }

    #[test]
    fn below_smallest_bound_is_most_stringent() {
        let scale = SeverityScale::iest_rp_cc012();
        assert_eq!(scale.classify(0.0).label(), "M");
        assert_eq!(scale.classify(1e-12).index(), 0);
    }

    #[test]
    fn above_every_bound_is_iso() {
        let scale = SeverityScale::iest_rp_cc012();
        let level = scale.classify(50.0001e-6);
        assert!(level.is_out_of_range());
        assert_eq!(level.index(), scale.len());
        assert_eq!(level.label(), "ISO");
    }

    #[test]
    fn nan_is_out_of_range() {
        let scale = SeverityScale::iest_rp_cc012();
        assert!(scale.classify(f64::NAN).is_out_of_range());
    }

    #[test]
    fn threshold_rejects_unknown_labels() {
        let scale = SeverityScale::iest_rp_cc012();
        for label in ["g", "", "N", "Z", "ISO", "VC-G"] {
            assert!(
                matches!(scale.threshold(label), Err(ScaleError::LabelNotFound { .. })),
                "label {:?} should be rejected",
                label
            );
        }
    }

    #[test]
    fn level_of_accepts_sentinel() {
        let scale = SeverityScale::iest_rp_cc012();
        assert!(scale.level_of("ISO").unwrap().is_out_of_range());
        assert_eq!(scale.level_of("G").unwrap().index(), 6);
        assert!(scale.level_of("iso").is_err());
    }

    #[test]
    fn levels_sort_in_display_order() {
        let scale = SeverityScale::iest_rp_cc012();
        let mut levels = vec![scale.classify(1.0), scale.classify(1e-6), scale.classify(1e-9)];
        levels.sort();
        let labels: Vec<&str> = levels.iter().map(|l| l.label()).collect();
        assert_eq!(labels, ["M", "F", "ISO"]);
    }

    #[test]
    fn rejects_broken_tables() {
        assert_eq!(
            SeverityScale::new(core::iter::empty::<(f64, &str)>(), "ISO"),
            Err(ScaleError::EmptyScale)
        );
        assert!(matches!(
            SeverityScale::new([(2.0, "A"), (2.0, "B")], "ISO"),
            Err(ScaleError::NonIncreasingBound { index: 1, .. })
        ));
        assert!(matches!(
            SeverityScale::new([(f64::INFINITY, "A")], "ISO"),
            Err(ScaleError::InvalidBound { index: 0, .. })
        ));
        assert!(matches!(
            SeverityScale::new([(-1.0, "A")], "ISO"),
            Err(ScaleError::InvalidBound { .. })
        ));
        assert!(matches!(
            SeverityScale::new([(1.0, "A"), (2.0, "A")], "ISO"),
            Err(ScaleError::DuplicateLabel { .. })
        ));
        assert!(matches!(
            SeverityScale::new([(1.0, "")], "ISO"),
            Err(ScaleError::EmptyLabel { index: 0 })
        ));
        assert!(matches!(
            SeverityScale::new([(1.0, "MUCH-TOO-LONG")], "ISO"),
            Err(ScaleError::LabelTooLong { .. })
        ));
        assert!(matches!(
            SeverityScale::new([(1.0, "ISO")], "ISO"),
            Err(ScaleError::SentinelCollision { .. })
        ));
    }

    #[test]
    fn reference_lines_default_window() {
        let scale = SeverityScale::iest_rp_cc012();
        let lines = scale.reference_lines(crate::constants::DEFAULT_REFERENCE_RANGE);
        let captions: Vec<&str> = lines.iter().map(|l| l.caption.as_str()).collect();
        assert_eq!(captions, ["VC-J", "VC-I", "VC-H", "VC-G", "VC-F", "VC-E", "VC-D"]);
        assert_eq!(lines[0].bound, 0.097e-6);
    }

    #[test]
    fn reference_lines_clip_to_table() {
        let scale = three_level();
        assert_eq!(scale.reference_lines(1..10).len(), 2);
        assert!(scale.reference_lines(5..10).is_empty());
    }

    #[test]
    fn config_round_trip() {
        let scale = three_level();
        let rebuilt = SeverityScale::try_from(scale.to_config()).unwrap();
        assert_eq!(rebuilt, scale);
    }
}
