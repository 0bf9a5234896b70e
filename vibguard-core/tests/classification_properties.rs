//! Property tests for VC classification
//!
//! Properties are checked against the standard IEST-RP-CC012 table and
//! against randomly generated scales, so they hold for any valid
//! configuration rather than for one hard-coded table.

use proptest::prelude::*;
use vibguard_core::{
    constants::vc::IEST_RP_CC012, Classifier, ScaleError, SeverityScale,
};

/// Smallest bound of the standard table (VC-M), m/s
const VC_M_LIMIT: f64 = 0.012e-6;

/// Largest bound of the standard table (VC-A), m/s
const VC_A_LIMIT: f64 = 50e-6;

/// Random valid scale: 1..12 strictly increasing bounds with labels L0, L1, ...
fn arb_scale() -> impl Strategy<Value = SeverityScale> {
    prop::collection::vec(1e-9f64..1e-5, 1..12).prop_map(|steps| {
        let mut bound = 0.0;
        let entries: Vec<(f64, String)> = steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| {
                bound += step;
                (bound, format!("L{}", i))
            })
            .collect();
        SeverityScale::new(entries, "OUT").expect("generated scale is valid")
    })
}

proptest! {
    #[test]
    fn below_smallest_bound_is_most_stringent(v in 0.0f64..VC_M_LIMIT) {
        let scale = SeverityScale::iest_rp_cc012();
        let level = scale.classify(v);
        prop_assert_eq!(level.label(), "M");
    }

    #[test]
    fn above_largest_bound_is_sentinel(v in (VC_A_LIMIT * 1.000_001)..1.0f64) {
        let scale = SeverityScale::iest_rp_cc012();
        let level = scale.classify(v);
        prop_assert!(level.is_out_of_range());
        prop_assert_eq!(level.label(), "ISO");
    }

    #[test]
    fn classification_is_monotonic(a in 0.0f64..1e-4, b in 0.0f64..1e-4) {
        let scale = SeverityScale::iest_rp_cc012();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(scale.classify(lo).index() <= scale.classify(hi).index());
    }

    #[test]
    fn level_brackets_the_value(scale in arb_scale(), v in 0.0f64..2e-4) {
        let level = scale.classify(v);
        let bounds: Vec<f64> = scale.entries().map(|(b, _)| b).collect();

        if level.is_out_of_range() {
            prop_assert!(v > bounds[bounds.len() - 1]);
        } else {
            prop_assert!(v <= bounds[level.index()]);
            if level.index() > 0 {
                prop_assert!(v > bounds[level.index() - 1]);
            }
        }
    }

    #[test]
    fn threshold_round_trips_on_any_scale(scale in arb_scale()) {
        for (bound, label) in scale.entries() {
            prop_assert_eq!(scale.threshold(label), Ok(bound));
            let level = scale.classify(bound);
            prop_assert_eq!(level.label(), label);
        }
    }

    #[test]
    fn threshold_rejects_strings_outside_the_scale(label in "[a-z]{0,3}") {
        let scale = SeverityScale::iest_rp_cc012();
        prop_assert_eq!(
            scale.threshold(&label),
            Err(ScaleError::LabelNotFound { label: label.clone() })
        );
    }
}

#[test]
fn round_trip_every_standard_label() {
    let scale = SeverityScale::iest_rp_cc012();
    for (bound, label) in IEST_RP_CC012 {
        let threshold = scale.threshold(label).unwrap();
        assert_eq!(threshold, bound);
        assert_eq!(scale.classify(threshold).label(), label);
    }
}

#[test]
fn three_level_scenario_in_micrometres() {
    let scale = SeverityScale::new(
        [(0.012e-6, "C"), (0.024e-6, "B"), (0.048e-6, "A")],
        "ISO",
    )
    .unwrap();

    assert_eq!(scale.classify(0.012e-6).label(), "C");
    assert_eq!(scale.classify(0.030e-6).label(), "A");
    assert_eq!(scale.classify(0.060e-6).label(), "ISO");
    assert_eq!(scale.threshold("C"), Ok(0.012e-6));
    assert!(matches!(scale.threshold("Z"), Err(ScaleError::LabelNotFound { .. })));
}

#[test]
fn classifier_is_shareable_across_threads() {
    let scale = std::sync::Arc::new(SeverityScale::iest_rp_cc012());
    let values: Vec<f64> = (0..1_000).map(|i| i as f64 * 1e-7).collect();

    let handles: Vec<_> = values
        .chunks(250)
        .map(|chunk| {
            let scale = std::sync::Arc::clone(&scale);
            let chunk = chunk.to_vec();
            std::thread::spawn(move || scale.as_ref().classify_all(&chunk))
        })
        .collect();

    let parallel: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(parallel, scale.classify_all(&values));
}
