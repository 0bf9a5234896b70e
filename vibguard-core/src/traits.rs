//! Core traits for classifiers
//!
//! Analysis code is generic over [`Classifier`] so an alternative severity
//! scale (or a test double) can stand in for the standard VC table.

use alloc::vec::Vec;

use crate::errors::ScaleResult;
use crate::scale::{SeverityScale, VcLevel};

/// Maps velocities to severity levels and labels back to bounds
pub trait Classifier {
    /// Classify one velocity magnitude (m/s). Never fails.
    fn classify(&self, value: f64) -> VcLevel;

    /// Upper bound for `label`; fails on any label the classifier lacks
    fn threshold(&self, label: &str) -> ScaleResult<f64>;

    /// Every level in display order, out-of-range sentinel last
    fn levels(&self) -> Vec<VcLevel>;

    /// Classify a batch of values
    fn classify_all(&self, values: &[f64]) -> Vec<VcLevel> {
        values.iter().map(|&v| self.classify(v)).collect()
    }
}

impl Classifier for SeverityScale {
    fn classify(&self, value: f64) -> VcLevel {
        SeverityScale::classify(self, value)
    }

    fn threshold(&self, label: &str) -> ScaleResult<f64> {
        SeverityScale::threshold(self, label)
    }

    fn levels(&self) -> Vec<VcLevel> {
        SeverityScale::levels(self)
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, value: f64) -> VcLevel {
        (**self).classify(value)
    }

    fn threshold(&self, label: &str) -> ScaleResult<f64> {
        (**self).threshold(label)
    }

    fn levels(&self) -> Vec<VcLevel> {
        (**self).levels()
    }
}
