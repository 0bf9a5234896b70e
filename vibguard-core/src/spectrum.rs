//! Spectrogram data from archived FFT waveforms
//!
//! The vibration IOC archives one FFT waveform per update, 1 Hz per bin
//! starting at 0 Hz. A [`Spectrogram`] slices every frame to a frequency
//! window and provides:
//!
//! - power per frame and frequency in dB (`10·log10`), ready for a colour map
//! - mean and max-hold spectra over the whole window (linear units)
//!
//! Zero power has no logarithm; such cells are floored to [`DB_FLOOR`]
//! instead of producing `-inf`.
//!
//! [`DB_FLOOR`]: crate::constants::analysis::DB_FLOOR

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::constants::analysis::{DB_FLOOR, FFT_BIN_WIDTH_HZ};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::sample::SpectrumSeries;
use crate::time::Timestamp;

/// Frequency-sliced FFT history of one PV
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Spectrogram {
    /// PV the frames came from
    pub pv: String,
    /// Frame timestamps
    pub times_ms: Vec<Timestamp>,
    /// Centre frequency of each retained bin (Hz)
    pub frequencies_hz: Vec<f64>,
    /// Power in dB, one row per frame, one column per frequency
    pub power_db: Vec<Vec<f64>>,
    /// Mean power per frequency (linear)
    pub mean: Vec<f64>,
    /// Maximum power per frequency (linear)
    pub max_hold: Vec<f64>,
}

impl Spectrogram {
    /// Build from `series`, keeping bins `freq_range.start..freq_range.end`
    pub fn build(series: &SpectrumSeries, freq_range: Range<usize>) -> AnalysisResult<Self> {
        let first = series.frames.first().ok_or(AnalysisError::EmptyInput)?;
        let bins = first.bins.len();

        for (index, frame) in series.frames.iter().enumerate() {
            if frame.bins.len() != bins {
                return Err(AnalysisError::RaggedSpectrum {
                    index,
                    expected: bins,
                    found: frame.bins.len(),
                });
            }
        }

        if freq_range.start >= freq_range.end || freq_range.end > bins {
            return Err(AnalysisError::InvalidFrequencyRange {
                start: freq_range.start,
                end: freq_range.end,
                bins,
            });
        }

        let width = freq_range.len();
        let mut mean = alloc::vec![0.0; width];
        let mut max_hold = alloc::vec![f64::NEG_INFINITY; width];
        let mut power_db = Vec::with_capacity(series.frames.len());
        let mut floored = 0usize;

        for frame in &series.frames {
            let slice = &frame.bins[freq_range.clone()];
            let mut row = Vec::with_capacity(width);
            for (i, &power) in slice.iter().enumerate() {
                mean[i] += power;
                max_hold[i] = max_hold[i].max(power);
                if power > 0.0 {
                    row.push(10.0 * libm::log10(power));
                } else {
                    floored += 1;
                    row.push(DB_FLOOR);
                }
            }
            power_db.push(row);
        }

        let frames = series.frames.len() as f64;
        for m in &mut mean {
            *m /= frames;
        }

        if floored > 0 {
            log_debug!("{}: {} non-positive FFT cells floored to {} dB", series.pv, floored, DB_FLOOR);
        }

        Ok(Self {
            pv: series.pv.clone(),
            times_ms: series.frames.iter().map(|f| f.timestamp_ms).collect(),
            frequencies_hz: freq_range.map(|bin| bin as f64 * FFT_BIN_WIDTH_HZ).collect(),
            power_db,
            mean,
            max_hold,
        })
    }

    /// Frequency with the highest max-hold power
    pub fn peak_frequency_hz(&self) -> Option<f64> {
        self.max_hold
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.frequencies_hz[i])
    }
}
