//! Archived samples and their VC classification
//!
//! A channel's history arrives from the archive as `(timestamp, value)`
//! pairs. [`classify_series`] augments each sample with its VC level and the
//! time until the next sample, which histograms use as dwell time.

use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::scale::VcLevel;
use crate::time::Timestamp;
use crate::traits::Classifier;

/// Single archived reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Sample {
    /// Archive timestamp (ms since epoch)
    pub timestamp_ms: Timestamp,
    /// Peak 1/3-octave velocity (m/s)
    pub value: f64,
}

impl Sample {
    /// Create a sample
    pub fn new(timestamp_ms: Timestamp, value: f64) -> Self {
        Self { timestamp_ms, value }
    }
}

/// Chronological history of one PV
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ChannelSeries {
    /// Full PV name
    pub pv: String,
    /// Samples sorted by timestamp
    pub samples: Vec<Sample>,
}

impl ChannelSeries {
    /// Create a series; samples are put in timestamp order
    pub fn new(pv: impl Into<String>, mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp_ms);
        Self { pv: pv.into(), samples }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the archive returned nothing for the window
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample values in order
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }
}

/// Sample augmented with its VC level
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ClassifiedSample {
    /// Archive timestamp (ms since epoch)
    pub timestamp_ms: Timestamp,
    /// Peak 1/3-octave velocity (m/s)
    pub value: f64,
    /// VC level of `value`
    pub level: VcLevel,
    /// Time until the next sample; `None` for the last one
    pub dt_to_next_ms: Option<u64>,
}

/// Classified history of one PV
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ClassifiedSeries {
    /// Full PV name
    pub pv: String,
    /// Classified samples in timestamp order
    pub samples: Vec<ClassifiedSample>,
}

impl ClassifiedSeries {
    /// Sample with the highest velocity
    pub fn peak(&self) -> Option<&ClassifiedSample> {
        self.samples
            .iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))
    }

    /// Loosest level reached over the series
    pub fn worst_level(&self) -> Option<&VcLevel> {
        self.samples.iter().map(|s| &s.level).max()
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if there are no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Classify every sample of `series`
pub fn classify_series<C: Classifier>(classifier: &C, series: &ChannelSeries) -> ClassifiedSeries {
    if series.is_empty() {
        log_warn!("No samples for {}", series.pv);
    }

    let samples = series
        .samples
        .iter()
        .enumerate()
        .map(|(i, sample)| ClassifiedSample {
            timestamp_ms: sample.timestamp_ms,
            value: sample.value,
            level: classifier.classify(sample.value),
            dt_to_next_ms: series
                .samples
                .get(i + 1)
                .map(|next| next.timestamp_ms.saturating_sub(sample.timestamp_ms)),
        })
        .collect();

    ClassifiedSeries { pv: series.pv.clone(), samples }
}

/// One archived FFT waveform
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SpectrumFrame {
    /// Archive timestamp (ms since epoch)
    pub timestamp_ms: Timestamp,
    /// Spectral power per 1 Hz bin, starting at 0 Hz
    pub bins: Vec<f64>,
}

/// Chronological FFT history of one PV
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SpectrumSeries {
    /// Full PV name
    pub pv: String,
    /// Frames sorted by timestamp
    pub frames: Vec<SpectrumFrame>,
}

impl SpectrumSeries {
    /// Create a series; frames are put in timestamp order
    pub fn new(pv: impl Into<String>, mut frames: Vec<SpectrumFrame>) -> Self {
        frames.sort_by_key(|f| f.timestamp_ms);
        Self { pv: pv.into(), frames }
    }
}
