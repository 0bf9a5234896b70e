//! Integration tests for the analysis flow
//!
//! Series → classification → alarms / histograms, with both the standard
//! and a substituted severity scale.

use vibguard_core::{
    classify_series, detect_alarms_all, AlarmConfig, ChannelSeries, LevelHistogram,
    LogHistogram, Sample, ScaleConfig, SeverityScale, TimeWindow,
};

/// One sample per second, as the VC peak PVs are archived.
const SAMPLE_INTERVAL_MS: u64 = 1_000;

/// Quiet background well inside VC-H (m/s).
const QUIET: f64 = 0.3e-6;

/// Disturbance between the VC-E and VC-D limits (m/s).
const LOUD: f64 = 5.0e-6;

fn day_with_bursts(pv: &str, bursts: &[(usize, usize)]) -> ChannelSeries {
    let samples = (0..600)
        .map(|i| {
            let loud = bursts.iter().any(|&(start, end)| i >= start && i < end);
            Sample::new(i as u64 * SAMPLE_INTERVAL_MS, if loud { LOUD } else { QUIET })
        })
        .collect();
    ChannelSeries::new(pv, samples)
}

#[test]
fn alarms_and_histograms_agree() {
    let scale = SeverityScale::iest_rp_cc012();
    let series = day_with_bursts("BL20I-DI-ACCEL-01:DATA:CH01:VC_PEAK", &[(100, 130), (400, 410)]);

    let classified = classify_series(&scale, &series);
    let histogram = LevelHistogram::build(&scale, &classified);

    let d = histogram.bins.iter().find(|b| b.level.label() == "D").unwrap();
    assert_eq!(d.count, 40);
    assert_eq!(d.dwell_ms, 40 * SAMPLE_INTERVAL_MS);

    let reports = detect_alarms_all(&scale, &[series], &AlarmConfig::new("G")).unwrap();
    let report = &reports[0];
    assert_eq!(report.samples.len(), d.count);
    assert_eq!(report.events.len(), 2);
    assert_eq!(report.events[0].duration_ms, 29 * SAMPLE_INTERVAL_MS);
    assert_eq!(report.events[1].peak_level.label(), "D");
}

#[test]
fn exclusion_window_removes_a_burst() {
    let scale = SeverityScale::iest_rp_cc012();
    let series = day_with_bursts("PV", &[(100, 130), (400, 410)]);
    let config = AlarmConfig::default().exclude(TimeWindow::new(90_000, 140_000));

    let reports = detect_alarms_all(&scale, &[series], &config).unwrap();
    assert_eq!(reports[0].events.len(), 1);
    assert_eq!(reports[0].events[0].start_ms, 400_000);
}

#[test]
fn substituted_scale_changes_labels_not_algorithm() {
    let config: ScaleConfig = serde_json::from_str(
        r#"{ "entries": [
                { "upper_bound": 1.0e-6, "label": "OK" },
                { "upper_bound": 4.0e-6, "label": "WARN" }
             ],
             "out_of_range": "TRIP" }"#,
    )
    .unwrap();
    let scale = SeverityScale::try_from(config).unwrap();

    let series = day_with_bursts("PV", &[(0, 10)]);
    let classified = classify_series(&scale, &series);
    assert_eq!(classified.samples[0].level.label(), "TRIP");
    assert_eq!(classified.samples[10].level.label(), "OK");

    let reports = detect_alarms_all(&scale, &[series], &AlarmConfig::new("WARN")).unwrap();
    assert_eq!(reports[0].samples.len(), 10);
}

#[test]
fn sentinel_defaults_when_missing_from_config() {
    let config: ScaleConfig =
        serde_json::from_str(r#"{ "entries": [ { "upper_bound": 1.0, "label": "X" } ] }"#).unwrap();
    let scale = SeverityScale::try_from(config).unwrap();
    assert_eq!(scale.out_of_range_label(), "ISO");
}

#[test]
fn invalid_scale_config_is_rejected() {
    let config: ScaleConfig = serde_json::from_str(
        r#"{ "entries": [
                { "upper_bound": 2.0, "label": "A" },
                { "upper_bound": 1.0, "label": "B" }
             ] }"#,
    )
    .unwrap();
    assert!(SeverityScale::try_from(config).is_err());
}

#[test]
fn log_histogram_of_series_values() {
    let series = day_with_bursts("PV", &[(0, 60)]);
    let histogram = LogHistogram::build(&series.values(), 10, None).unwrap();
    assert_eq!(histogram.total(), 600);
    assert_eq!(histogram.bins.first().map(|b| b.count), Some(540));
    assert_eq!(histogram.bins.last().map(|b| b.count), Some(60));
}

#[test]
fn classified_series_serialises_labels_as_strings() {
    let scale = SeverityScale::iest_rp_cc012();
    let series = ChannelSeries::new("PV", vec![Sample::new(0, QUIET)]);
    let json = serde_json::to_value(classify_series(&scale, &series)).unwrap();
    assert_eq!(json["samples"][0]["level"], "H");
}
