mod common;

use common::{assert_close, grid_leadfield, line_leadfield, store};
use rstest::rstest;
use std::collections::BTreeSet;
use tiforge::currents::CurrentPair;
use tiforge::error::EvaluationError;
use tiforge::evaluator::envelope::{max_ti_amplitude, Vec3};
use tiforge::evaluator::stats::{range, weighted_average, weighted_percentile};
use tiforge::evaluator::{CandidateEvaluator, EvaluationOptions};
use tiforge::leadfield::RegionSelection;
use tiforge::montage::MontageCandidate;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

fn line_candidate() -> MontageCandidate {
    // Channel 1 = A - R, channel 2 = B - R: identical fields (k + 1, 0, 0).
    MontageCandidate::new("A", "R", "B", "R", CurrentPair::new(1.0, 1.0))
}

fn region(indices: &[usize], weights: &[f32]) -> RegionSelection {
    RegionSelection {
        indices: indices.to_vec(),
        weights: weights.to_vec(),
    }
}

#[rstest]
#[case([1.0, 0.0, 0.0], [1.0, 0.0, 0.0], 2.0)]
#[case([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], SQRT_2)]
#[case([1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], 2.0)]
#[case([2.0, 0.0, 0.0], [1.0, 0.0, 0.0], 2.0)]
#[case([3.0, 0.0, 0.0], [0.0, 0.0, 0.0], 0.0)]
#[case([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 0.0)]
fn test_envelope_closed_form(#[case] e1: Vec3, #[case] e2: Vec3, #[case] expected: f64) {
    assert_close(max_ti_amplitude(e1, e2), expected);
}

#[test]
fn test_envelope_is_symmetric_and_bounded() {
    let mut rng = fastrand::Rng::with_seed(11);
    for _ in 0..200 {
        let mut v = || [rng.f64() - 0.5, rng.f64() - 0.5, rng.f64() - 0.5];
        let (a, b) = (v(), v());
        let ab = max_ti_amplitude(a, b);
        let ba = max_ti_amplitude(b, a);
        assert!((ab - ba).abs() < 1e-12);

        // Never more than twice the weaker field.
        let weaker = f64::min(
            (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt(),
            (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]).sqrt(),
        );
        assert!(ab >= 0.0 && ab <= 2.0 * weaker + 1e-12);
    }
}

#[test]
fn test_metrics_on_known_fields() {
    let lf = store(line_leadfield());
    let roi = region(&[2], &[2.0]);
    let reference = lf.select_tags(&BTreeSet::from([2]));
    assert_eq!(reference.indices, vec![1, 2]);

    let metrics = CandidateEvaluator::new(&lf, &roi, Some(&reference))
        .evaluate(&line_candidate())
        .unwrap();

    // Envelope is 2(k + 1): 2, 4, 6 at elements 0..3.
    assert_close(metrics.ti_max_roi.unwrap(), 6.0);
    assert_close(metrics.ti_mean_roi.unwrap(), 6.0);
    assert_close(metrics.ti_mean_reference.unwrap(), (4.0 + 2.0 * 6.0) / 3.0);
    assert_close(metrics.focality.unwrap(), 1.125);
    assert_close(metrics.composite_index().unwrap(), 6.75);
    assert_eq!(metrics.n_elements, 1);
}

#[test]
fn test_zero_reference_mean_gives_zero_focality() {
    let lf = store(line_leadfield());
    let roi = region(&[0, 1], &[1.0, 1.0]);
    let reference = lf.select_tags(&BTreeSet::from([3]));

    let metrics = CandidateEvaluator::new(&lf, &roi, Some(&reference))
        .evaluate(&line_candidate())
        .unwrap();
    assert_eq!(metrics.ti_mean_reference, Some(0.0));
    assert_eq!(metrics.focality, Some(0.0));
    assert_eq!(metrics.composite_index(), Some(0.0));
}

#[test]
fn test_missing_reference_leaves_focality_unset() {
    let lf = store(line_leadfield());
    let roi = region(&[0, 1, 2], &[1.0, 1.0, 2.0]);

    for reference in [None, Some(&RegionSelection::default())] {
        let metrics = CandidateEvaluator::new(&lf, &roi, reference)
            .evaluate(&line_candidate())
            .unwrap();
        assert_close(metrics.ti_mean_roi.unwrap(), (2.0 + 4.0 + 12.0) / 4.0);
        assert_eq!(metrics.ti_mean_reference, None);
        assert_eq!(metrics.focality, None);
        assert_eq!(metrics.composite_index(), None);
        assert_eq!(metrics.n_elements, 3);
    }
}

#[rstest]
#[case(50.0, 4.0)]
#[case(99.9, 6.0)]
#[case(10.0, 2.0)]
fn test_roi_percentile(#[case] percentile: f64, #[case] expected: f64) {
    let lf = store(line_leadfield());
    let roi = region(&[0, 1, 2], &[1.0, 1.0, 2.0]);
    let metrics = CandidateEvaluator::new(&lf, &roi, None)
        .with_options(EvaluationOptions { percentile })
        .evaluate(&line_candidate())
        .unwrap();
    assert_close(metrics.ti_percentile_roi.unwrap(), expected);
}

#[test]
fn test_currents_scale_the_envelope() {
    let lf = store(line_leadfield());
    let roi = region(&[2], &[1.0]);
    let candidate = MontageCandidate::new("A", "R", "B", "R", CurrentPair::new(1.5, 0.5));
    let metrics = CandidateEvaluator::new(&lf, &roi, None)
        .evaluate(&candidate)
        .unwrap();
    // Parallel fields 4.5 and 1.5: twice the weaker one.
    assert_close(metrics.ti_max_roi.unwrap(), 3.0);
}

#[test]
fn test_unknown_electrode_is_an_error() {
    let lf = store(line_leadfield());
    let roi = region(&[0], &[1.0]);
    let candidate = MontageCandidate::new("A", "Z9", "B", "R", CurrentPair::new(1.0, 1.0));
    assert_eq!(
        CandidateEvaluator::new(&lf, &roi, None).evaluate(&candidate),
        Err(EvaluationError::UnknownElectrode("Z9".to_string()))
    );
}

#[test]
fn test_malformed_regions_are_errors() {
    let lf = store(line_leadfield());
    let candidate = line_candidate();

    let out_of_range = region(&[10], &[1.0]);
    assert_eq!(
        CandidateEvaluator::new(&lf, &out_of_range, None).evaluate(&candidate),
        Err(EvaluationError::ElementOutOfRange {
            index: 10,
            n_elements: 4
        })
    );

    let weightless = region(&[0, 1], &[0.0, 0.0]);
    assert_eq!(
        CandidateEvaluator::new(&lf, &weightless, None).evaluate(&candidate),
        Err(EvaluationError::DegenerateWeights)
    );
}

#[test]
fn test_full_envelope_covers_every_element() {
    let lf = store(grid_leadfield(&["E1", "E2", "E3", "E4"], 5));
    let roi = RegionSelection::default();
    let candidate = MontageCandidate::new("E1", "E2", "E3", "E4", CurrentPair::new(1.0, 1.0));
    let env = CandidateEvaluator::new(&lf, &roi, None)
        .full_envelope(&candidate)
        .unwrap();
    assert_eq!(env.len(), lf.n_elements());
    assert!(env.iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
fn test_weighted_statistics() {
    assert_eq!(weighted_average(&[], &[]), None);
    assert_eq!(weighted_average(&[1.0, 3.0], &[0.0, 0.0]), None);
    assert_close(weighted_average(&[1.0, 3.0], &[1.0, 3.0]).unwrap(), 2.5);

    assert_eq!(weighted_percentile(&[], &[], 50.0), None);
    assert_eq!(weighted_percentile(&[5.0, 1.0, 3.0], &[1.0, 1.0, 1.0], 100.0), Some(5.0));
    assert_eq!(weighted_percentile(&[5.0, 1.0, 3.0], &[1.0, 1.0, 1.0], 0.0), Some(1.0));
    // Zero-weight maxima never win.
    assert_eq!(weighted_percentile(&[5.0, 1.0, 3.0], &[0.0, 1.0, 1.0], 100.0), Some(3.0));

    assert_eq!(range([Some(2.0), None, Some(-1.0), Some(4.0)]), Some((-1.0, 4.0)));
    assert_eq!(range([None, None]), None);
}
