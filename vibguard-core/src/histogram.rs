//! Histograms of classified vibration data
//!
//! Two views are provided:
//!
//! - [`LevelHistogram`]: how many samples, and how much time, a channel
//!   spent at each VC level. Dwell time uses each sample's gap to the next
//!   one, so irregular archiving (deadband, on-change) does not skew the
//!   picture.
//! - [`LogHistogram`]: velocity distribution on logarithmic bins, matching
//!   the log axis the VC curves are usually drawn on.

use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::errors::{AnalysisError, AnalysisResult};
use crate::sample::ClassifiedSeries;
use crate::scale::VcLevel;
use crate::traits::Classifier;

/// Count and dwell time at one VC level
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LevelBin {
    /// The level
    pub level: VcLevel,
    /// Samples classified at this level
    pub count: usize,
    /// Sum of the samples' gaps to their successor (ms)
    pub dwell_ms: u64,
}

/// Per-level breakdown of one channel, in scale display order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LevelHistogram {
    /// PV summarised
    pub pv: String,
    /// One bin per level, sentinel last
    pub bins: Vec<LevelBin>,
}

impl LevelHistogram {
    /// Tally `series` against every level of `classifier`
    pub fn build<C: Classifier>(classifier: &C, series: &ClassifiedSeries) -> Self {
        let mut bins: Vec<LevelBin> = classifier
            .levels()
            .into_iter()
            .map(|level| LevelBin { level, count: 0, dwell_ms: 0 })
            .collect();

        for sample in &series.samples {
            if let Some(bin) = bins.iter_mut().find(|b| b.level == sample.level) {
                bin.count += 1;
                bin.dwell_ms += sample.dt_to_next_ms.unwrap_or(0);
            }
        }

        Self { pv: series.pv.clone(), bins }
    }

    /// Total samples tallied
    pub fn total_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Total dwell time tallied (ms)
    pub fn total_dwell_ms(&self) -> u64 {
        self.bins.iter().map(|b| b.dwell_ms).sum()
    }

    /// Share of dwell time spent at `label` (0.0 when nothing was tallied)
    pub fn time_fraction(&self, label: &str) -> f64 {
        let total = self.total_dwell_ms();
        if total == 0 {
            return 0.0;
        }
        self.bins
            .iter()
            .find(|b| b.level.label() == label)
            .map(|b| b.dwell_ms as f64 / total as f64)
            .unwrap_or(0.0)
    }
}

/// One logarithmic bin `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HistogramBin {
    /// Lower edge (m/s)
    pub lower: f64,
    /// Upper edge (m/s)
    pub upper: f64,
    /// Values in the bin
    pub count: usize,
}

/// Velocity distribution on logarithmically spaced bins
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LogHistogram {
    /// Bins in ascending order
    pub bins: Vec<HistogramBin>,
    /// Values not binned: non-positive, non-finite or outside the range
    pub skipped: usize,
}

impl LogHistogram {
    /// Bin `values` into `bins` log-spaced bins.
    ///
    /// With `range = None` the range spans the smallest to the largest
    /// positive value. The top edge is inclusive.
    pub fn build(values: &[f64], bins: usize, range: Option<(f64, f64)>) -> AnalysisResult<Self> {
        if bins == 0 {
            return Err(AnalysisError::InvalidBinning { reason: "need at least one bin" });
        }

        let usable = |v: f64| v.is_finite() && v > 0.0;

        let (lo, hi) = match range {
            Some((lo, hi)) => {
                if !(usable(lo) && usable(hi) && lo < hi) {
                    return Err(AnalysisError::InvalidBinning {
                        reason: "range must be positive, finite and increasing",
                    });
                }
                (lo, hi)
            }
            None => {
                let mut positives = values.iter().copied().filter(|&v| usable(v));
                let first = positives.next().ok_or(AnalysisError::EmptyInput)?;
                let (lo, hi) = positives.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
                if lo == hi {
                    (lo / 2.0, hi * 2.0)
                } else {
                    (lo, hi)
                }
            }
        };

        let log_lo = libm::log10(lo);
        let log_hi = libm::log10(hi);
        let step = (log_hi - log_lo) / bins as f64;

        let mut out: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                lower: libm::pow(10.0, log_lo + step * i as f64),
                upper: libm::pow(10.0, log_lo + step * (i + 1) as f64),
                count: 0,
            })
            .collect();

        let mut skipped = 0;
        for &value in values {
            if !usable(value) || value < lo || value > hi {
                skipped += 1;
                continue;
            }
            let position = ((libm::log10(value) - log_lo) / step) as usize;
            out[position.min(bins - 1)].count += 1;
        }

        Ok(Self { bins: out, skipped })
    }

    /// Values binned
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{classify_series, ChannelSeries, Sample};
    use crate::scale::SeverityScale;
    use alloc::vec;

    #[test]
    fn level_histogram_counts_and_dwell() {
        let scale = SeverityScale::iest_rp_cc012();
        let series = ChannelSeries::new(
            "PV",
            vec![
                Sample::new(0, 0.5e-6),
                Sample::new(1_000, 0.5e-6),
                Sample::new(4_000, 60e-6),
                Sample::new(5_000, 0.5e-6),
            ],
        );
        let histogram = LevelHistogram::build(&scale, &classify_series(&scale, &series));

        assert_eq!(histogram.bins.len(), scale.len() + 1);
        let g = histogram.bins.iter().find(|b| b.level.label() == "G").unwrap();
        assert_eq!((g.count, g.dwell_ms), (3, 4_000));
        let iso = histogram.bins.last().unwrap();
        assert_eq!((iso.count, iso.dwell_ms), (1, 1_000));

        assert_eq!(histogram.total_count(), 4);
        assert_eq!(histogram.time_fraction("G"), 0.8);
        assert_eq!(histogram.time_fraction("nope"), 0.0);
    }

    #[test]
    fn log_bins_cover_decades() {
        let values = [2e-8, 5e-8, 2e-7, 5e-7, 1e-6];
        let histogram = LogHistogram::build(&values, 2, Some((1e-8, 1e-6))).unwrap();

        assert_eq!(histogram.bins.len(), 2);
        assert!((histogram.bins[0].upper - 1e-7).abs() < 1e-15);
        assert_eq!(histogram.bins[0].count, 2);
        assert_eq!(histogram.bins[1].count, 3);
        assert_eq!(histogram.skipped, 0);
    }

    #[test]
    fn non_positive_and_out_of_range_values_are_skipped() {
        let values = [0.0, -1.0, f64::NAN, 1e-9, 1e-7];
        let histogram = LogHistogram::build(&values, 4, Some((1e-8, 1e-6))).unwrap();
        assert_eq!(histogram.total(), 1);
        assert_eq!(histogram.skipped, 4);
    }

    #[test]
    fn auto_range_uses_positive_extremes() {
        let histogram = LogHistogram::build(&[0.0, 1e-8, 1e-6], 10, None).unwrap();
        assert_eq!(histogram.total(), 2);
        assert_eq!(histogram.skipped, 1);
        assert_eq!(histogram.bins.last().map(|b| b.count), Some(1));
    }

    #[test]
    fn single_value_gets_a_widened_range() {
        let histogram = LogHistogram::build(&[1e-7], 3, None).unwrap();
        assert_eq!(histogram.total(), 1);
    }

    #[test]
    fn invalid_binning_is_rejected() {
        assert!(matches!(
            LogHistogram::build(&[1e-7], 0, None),
            Err(AnalysisError::InvalidBinning { .. })
        ));
        assert!(matches!(
            LogHistogram::build(&[1e-7], 3, Some((0.0, 1.0))),
            Err(AnalysisError::InvalidBinning { .. })
        ));
        assert_eq!(LogHistogram::build(&[0.0, -2.0], 3, None), Err(AnalysisError::EmptyInput));
    }
}
