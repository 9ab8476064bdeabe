use inputlab_analysis::{TrajectoryAnalyzer, compute_metrics};
use inputlab_core::{Metrics, Sample, Trajectory};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    -2000.0..2000.0f64
}

fn trajectory_strategy(max_len: usize) -> impl Strategy<Value = Trajectory> {
    proptest::collection::vec((coord(), coord()), 0..max_len)
        .prop_map(|points| points.into_iter().collect())
}

fn summed_length(t: &Trajectory) -> f64 {
    t.segments().map(|(a, b)| a.distance_to(b)).sum()
}

proptest! {
    #[test]
    fn short_trajectories_are_all_zero(points in proptest::collection::vec((coord(), coord()), 0..2)) {
        let t: Trajectory = points.into_iter().collect();
        prop_assert_eq!(compute_metrics(&t), Metrics::ZERO);
    }

    #[test]
    fn distance_is_the_summed_segment_length(t in trajectory_strategy(64)) {
        let expected = summed_length(&t);
        let analysis = TrajectoryAnalyzer::default().analyze(&t);
        prop_assert!((analysis.distance - expected).abs() <= 1e-9 * expected.max(1.0));
        if t.len() >= 2 {
            prop_assert_eq!(analysis.metrics().distance, expected.round() as u64);
        }
    }

    #[test]
    fn percentages_stay_in_range(t in trajectory_strategy(64)) {
        let analysis = TrajectoryAnalyzer::default().analyze(&t);
        prop_assert!(analysis.speed.is_finite());
        prop_assert!((0.0..=100.0).contains(&analysis.smoothness));
        prop_assert!((0.0..=100.0).contains(&analysis.accuracy));
        prop_assert!((0.0..=1.0).contains(&analysis.path_efficiency));
        prop_assert!((0.0..=1.0).contains(&analysis.deviation_consistency));
        prop_assert!(analysis.angles.iter().all(|a| a.is_finite()));
        let m = analysis.metrics();
        prop_assert!(m.smoothness <= 100 && m.accuracy <= 100);
    }

    #[test]
    fn analysis_is_pure(t in trajectory_strategy(64)) {
        let analyzer = TrajectoryAnalyzer::default();
        let first = analyzer.analyze(&t);
        let second = analyzer.analyze(&t.clone());
        prop_assert_eq!(first.distance.to_bits(), second.distance.to_bits());
        prop_assert_eq!(first.speed.to_bits(), second.speed.to_bits());
        prop_assert_eq!(first.metrics(), second.metrics());
    }

    #[test]
    fn repeated_samples_leave_turning_unchanged(
        t in trajectory_strategy(40),
        repeats in proptest::collection::vec(0usize..3, 40),
    ) {
        let padded: Trajectory = t
            .samples()
            .iter()
            .zip(&repeats)
            .flat_map(|(s, &r)| std::iter::repeat_n(*s, r + 1))
            .collect();
        let analyzer = TrajectoryAnalyzer::default();
        let plain = analyzer.analyze(&t);
        let held = analyzer.analyze(&padded);
        prop_assert_eq!(plain.angles, held.angles);
        prop_assert_eq!(plain.smoothness.to_bits(), held.smoothness.to_bits());
    }

    #[test]
    fn straight_runs_score_full_marks(
        (x0, y0) in (coord(), coord()),
        angle in 0.0..std::f64::consts::TAU,
        step in 1.0..50.0f64,
        n in 3usize..60,
    ) {
        let (dx, dy) = (angle.cos() * step, angle.sin() * step);
        let t: Trajectory = (0..n)
            .map(|i| Sample::new(x0 + dx * i as f64, y0 + dy * i as f64))
            .collect();
        let m = compute_metrics(&t);
        prop_assert_eq!(m.smoothness, 100);
        prop_assert_eq!(m.accuracy, 100);
    }
}

#[test]
fn fifty_sample_run_is_bit_identical_across_calls() {
    let t: Trajectory = (0..50)
        .map(|i| {
            let f = i as f64;
            Sample::new(f * 7.0 + (f * 0.3).sin() * 12.0, f * 3.0 + (f * 0.7).cos() * 5.0)
        })
        .collect();
    let analyzer = TrajectoryAnalyzer::default();
    let a = analyzer.analyze(&t);
    let b = analyzer.analyze(&t);
    assert_eq!(a, b);
    assert_eq!(compute_metrics(&t), compute_metrics(&t));
}

#[test]
fn right_angle_is_less_smooth_than_straight() {
    let straight: Trajectory = [(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)].into_iter().collect();
    let turn: Trajectory = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)].into_iter().collect();
    let s = compute_metrics(&straight);
    let r = compute_metrics(&turn);
    assert_eq!((s.distance, s.smoothness, s.accuracy), (20, 100, 100));
    assert_eq!(r.distance, 20);
    assert!(r.smoothness < s.smoothness);
}

#[test]
fn backtracking_is_less_accurate() {
    let t: Trajectory = [(0.0, 0.0), (10.0, 0.0), (0.0, 0.0), (10.0, 0.0)]
        .into_iter()
        .collect();
    let analysis = TrajectoryAnalyzer::default().analyze(&t);
    assert!(analysis.path_efficiency < 1.0);
    assert!(analysis.metrics().accuracy < 100);
}
