//! Vibration Alarms
//!
//! ## Overview
//!
//! An alarm is raised for every sample whose velocity is at or above the
//! limit of a chosen VC level, i.e. every sample that would fail that
//! level's criterion. Alarm samples close together in time are merged into
//! alarm events so a noisy hour reads as one incident rather than
//! thousands of rows.
//!
//! ```text
//! value  ▁▁▇▇▁▇▁▁▁▁▁▁▁▁▁▇▁
//!           └──┬──┘         └ event 2
//!            event 1 (gaps <= merge_gap_ms)
//! ```
//!
//! ## Exclusions
//!
//! Known noisy periods (crane moves, maintenance) can be excluded with
//! time windows; samples inside them never alarm.
//!
//! ## Failure
//!
//! The threshold label is resolved before any sample is looked at. An
//! unknown label fails with [`ScaleError::LabelNotFound`]: guessing a
//! cutoff would silently change what the alarm means.
//!
//! [`ScaleError::LabelNotFound`]: crate::errors::ScaleError::LabelNotFound

use alloc::string::{String, ToString};
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::constants::time::DEFAULT_ALARM_MERGE_GAP_MS;
use crate::constants::vc::DEFAULT_ALARM_LABEL;
use crate::errors::ScaleResult;
use crate::sample::ChannelSeries;
use crate::scale::VcLevel;
use crate::time::{TimeWindow, Timestamp};
use crate::traits::Classifier;

/// Alarm detection settings
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmConfig {
    /// VC level whose limit triggers an alarm
    pub threshold_label: String,
    /// Largest gap between alarm samples of the same event (ms)
    pub merge_gap_ms: u64,
    /// Windows in which samples are ignored
    pub exclusions: Vec<TimeWindow>,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            threshold_label: DEFAULT_ALARM_LABEL.to_string(),
            merge_gap_ms: DEFAULT_ALARM_MERGE_GAP_MS,
            exclusions: Vec::new(),
        }
    }
}

impl AlarmConfig {
    /// Alarm on the limit of `label`
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            threshold_label: label.into(),
            ..Self::default()
        }
    }

    /// Set the merge gap
    pub fn merge_gap_ms(mut self, gap_ms: u64) -> Self {
        self.merge_gap_ms = gap_ms;
        self
    }

    /// Add an exclusion window
    pub fn exclude(mut self, window: TimeWindow) -> Self {
        self.exclusions.push(window);
        self
    }

    fn is_excluded(&self, timestamp: Timestamp) -> bool {
        self.exclusions.iter().any(|w| w.contains(timestamp))
    }
}

/// A sample at or above the alarm limit
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AlarmSample {
    /// Archive timestamp (ms since epoch)
    pub timestamp_ms: Timestamp,
    /// Velocity (m/s)
    pub value: f64,
    /// VC level of the sample
    pub level: VcLevel,
    /// Time until the next alarm sample; `None` for the last one
    pub time_to_next_alarm_ms: Option<u64>,
}

/// Run of alarm samples with gaps no larger than the merge gap
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AlarmEvent {
    /// PV that raised the alarm
    pub pv: String,
    /// First alarm sample
    pub start_ms: Timestamp,
    /// Last alarm sample
    pub end_ms: Timestamp,
    /// `end_ms - start_ms`
    pub duration_ms: u64,
    /// Highest velocity in the event (m/s)
    pub peak_value: f64,
    /// Level of the peak
    pub peak_level: VcLevel,
    /// Number of alarm samples merged
    pub sample_count: usize,
}

/// Alarms for one PV
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AlarmReport {
    /// PV examined
    pub pv: String,
    /// Threshold level label
    pub threshold_label: String,
    /// Threshold velocity (m/s)
    pub threshold: f64,
    /// Samples examined (exclusions removed)
    pub examined: usize,
    /// Every alarm sample
    pub samples: Vec<AlarmSample>,
    /// Merged alarm events
    pub events: Vec<AlarmEvent>,
}

impl AlarmReport {
    /// True if nothing reached the threshold
    pub fn is_clear(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Find alarms in one series
pub fn detect_alarms<C: Classifier>(
    classifier: &C,
    series: &ChannelSeries,
    config: &AlarmConfig,
) -> ScaleResult<AlarmReport> {
    let threshold = classifier.threshold(&config.threshold_label)?;
    Ok(scan(classifier, series, config, threshold))
}

/// Find alarms in several series, one report per series in input order
pub fn detect_alarms_all<C: Classifier>(
    classifier: &C,
    series: &[ChannelSeries],
    config: &AlarmConfig,
) -> ScaleResult<Vec<AlarmReport>> {
    let threshold = classifier.threshold(&config.threshold_label)?;
    Ok(series.iter().map(|s| scan(classifier, s, config, threshold)).collect())
}

fn scan<C: Classifier>(
    classifier: &C,
    series: &ChannelSeries,
    config: &AlarmConfig,
    threshold: f64,
) -> AlarmReport {
    let mut examined = 0;
    let mut samples: Vec<AlarmSample> = Vec::new();

    for sample in series.samples.iter().filter(|s| !config.is_excluded(s.timestamp_ms)) {
        examined += 1;
        if sample.value >= threshold {
            samples.push(AlarmSample {
                timestamp_ms: sample.timestamp_ms,
                value: sample.value,
                level: classifier.classify(sample.value),
                time_to_next_alarm_ms: None,
            });
        }
    }

    for i in 1..samples.len() {
        let gap = samples[i].timestamp_ms.saturating_sub(samples[i - 1].timestamp_ms);
        samples[i - 1].time_to_next_alarm_ms = Some(gap);
    }

    let events = merge_events(&series.pv, &samples, config.merge_gap_ms);

    if !events.is_empty() {
        log_info!(
            "{}: {} alarm samples in {} events at or above VC-{}",
            series.pv,
            samples.len(),
            events.len(),
            config.threshold_label
        );
    }

    AlarmReport {
        pv: series.pv.clone(),
        threshold_label: config.threshold_label.clone(),
        threshold,
        examined,
        samples,
        events,
    }
}

fn merge_events(pv: &str, samples: &[AlarmSample], merge_gap_ms: u64) -> Vec<AlarmEvent> {
    let mut events: Vec<AlarmEvent> = Vec::new();

    for sample in samples {
        match events.last_mut() {
            Some(event) if sample.timestamp_ms.saturating_sub(event.end_ms) <= merge_gap_ms => {
                event.end_ms = sample.timestamp_ms;
                event.duration_ms = event.end_ms - event.start_ms;
                event.sample_count += 1;
                if sample.value > event.peak_value {
                    event.peak_value = sample.value;
                    event.peak_level = sample.level.clone();
                }
            }
            _ => events.push(AlarmEvent {
                pv: pv.to_string(),
                start_ms: sample.timestamp_ms,
                end_ms: sample.timestamp_ms,
                duration_ms: 0,
                peak_value: sample.value,
                peak_level: sample.level.clone(),
                sample_count: 1,
            }),
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScaleError;
    use crate::sample::Sample;
    use crate::scale::SeverityScale;
    use alloc::vec;

    const G_LIMIT: f64 = 0.78e-6;

    fn series(points: &[(u64, f64)]) -> ChannelSeries {
        ChannelSeries::new(
            "BL20I-DI-ACCEL-01:DATA:CH01:VC_PEAK",
            points.iter().map(|&(t, v)| Sample::new(t, v)).collect(),
        )
    }

    #[test]
    fn value_on_limit_alarms() {
        let scale = SeverityScale::iest_rp_cc012();
        let report = detect_alarms(
            &scale,
            &series(&[(0, G_LIMIT * 0.99), (1000, G_LIMIT)]),
            &AlarmConfig::default(),
        )
        .unwrap();

        assert_eq!(report.samples.len(), 1);
        assert_eq!(report.samples[0].timestamp_ms, 1000);
        assert_eq!(report.threshold, G_LIMIT);
    }

    #[test]
    fn close_alarms_merge_into_one_event() {
        let scale = SeverityScale::iest_rp_cc012();
        let config = AlarmConfig::new("G").merge_gap_ms(2_000);
        let report = detect_alarms(
            &scale,
            &series(&[
                (0, 1.0e-6),
                (1_000, 2.0e-6),
                (2_000, 0.1e-6),
                (3_000, 1.5e-6),
                (60_000, 4.0e-6),
            ]),
            &config,
        )
        .unwrap();

        assert_eq!(report.events.len(), 2);
        let first = &report.events[0];
        assert_eq!((first.start_ms, first.end_ms, first.duration_ms), (0, 3_000, 3_000));
        assert_eq!(first.sample_count, 3);
        assert_eq!(first.peak_value, 2.0e-6);
        assert_eq!(first.peak_level.label(), "E");

        let second = &report.events[1];
        assert_eq!(second.sample_count, 1);
        assert_eq!(second.duration_ms, 0);
    }

    #[test]
    fn time_to_next_alarm_links_alarm_samples() {
        let scale = SeverityScale::iest_rp_cc012();
        let report = detect_alarms(
            &scale,
            &series(&[(0, 1e-6), (500, 1e-9), (1_500, 1e-6)]),
            &AlarmConfig::default(),
        )
        .unwrap();

        let gaps: Vec<Option<u64>> = report.samples.iter().map(|s| s.time_to_next_alarm_ms).collect();
        assert_eq!(gaps, vec![Some(1_500), None]);
    }

    #[test]
    fn exclusions_suppress_alarms() {
        let scale = SeverityScale::iest_rp_cc012();
        let config = AlarmConfig::default().exclude(TimeWindow::new(0, 2_000));
        let report = detect_alarms(&scale, &series(&[(0, 9e-6), (1_000, 9e-6), (2_000, 9e-6)]), &config)
            .unwrap();

        assert_eq!(report.examined, 1);
        assert_eq!(report.samples.len(), 1);
        assert_eq!(report.samples[0].timestamp_ms, 2_000);
    }

    #[test]
    fn quiet_series_is_clear() {
        let scale = SeverityScale::iest_rp_cc012();
        let report = detect_alarms(&scale, &series(&[(0, 1e-9)]), &AlarmConfig::default()).unwrap();
        assert!(report.is_clear());
        assert!(report.events.is_empty());
    }

    #[test]
    fn unknown_threshold_label_fails_fast() {
        let scale = SeverityScale::iest_rp_cc012();
        let err = detect_alarms_all(&scale, &[series(&[(0, 1.0)])], &AlarmConfig::new("g")).unwrap_err();
        assert_eq!(err, ScaleError::LabelNotFound { label: "g".into() });
    }
}
