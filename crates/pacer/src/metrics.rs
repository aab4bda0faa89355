//! Derived coaching metrics.
//!
//! Everything here is a pure function of the route, the simulation state and
//! the sample history, so it can be called from any tick or on demand.

use crate::history::SampleHistory;
use crate::models::MetricsSnapshot;
use crate::route::Route;
use crate::simulation::SimulationState;

/// Minimum history length for a meaningful pace CV.
const MIN_CV_SAMPLES: usize = 3;

pub fn aggregate(route: &Route, state: &SimulationState, history: &SampleHistory) -> MetricsSnapshot {
    let total_m = route.total_distance_m();
    let i = state.segment_index.min(route.segment_count() - 1);
    let pace_obj = route.objective_pace(i);
    let pace_now = state.pace;

    let (done_m, next_change_m) = if state.finished {
        (total_m, 0.0)
    } else {
        let done = route.distance_at(i);
        let j = next_pace_change(route, i);
        (done, route.distance_at(j) - done)
    };

    let next_change_km = next_change_m / 1000.0;
    let time_next_change_min = next_change_km * pace_now;
    let time_next_change_obj_min = next_change_km * pace_obj;

    MetricsSnapshot {
        segment_index: i,
        finished: state.finished,
        elapsed_ms: state.elapsed_ms,
        done_km: done_m / 1000.0,
        remain_km: (total_m - done_m) / 1000.0,
        pace_obj,
        pace_now,
        pace_avg: route.mean_pace(),
        pace_gap: pace_now - pace_obj,
        next_change_km,
        time_next_change_min,
        time_next_change_obj_min,
        eta_gap_min: time_next_change_min - time_next_change_obj_min,
        pace_cv: pace_cv(history),
        heart_rate: state.heart_rate,
        hr_avg: hr_average(history, state.heart_rate),
        time_run_min: state.elapsed_ms as f64 / 60_000.0,
    }
}

/// Waypoint index where the objective pace first differs from segment `i`,
/// or the last waypoint when it never does. `i` past the end reads as the
/// last segment.
pub fn next_pace_change(route: &Route, i: usize) -> usize {
    let paces = route.paces();
    let i = i.min(paces.len() - 1);
    let current = paces[i];
    paces[i..]
        .iter()
        .position(|&p| p != current)
        .map_or(paces.len(), |offset| i + offset)
}

pub fn pace_cv(history: &SampleHistory) -> f64 {
    if history.pace.len() < MIN_CV_SAMPLES {
        return 0.0;
    }
    let values: Vec<f64> = history.pace.values().collect();
    coefficient_of_variation(&values)
}

/// Sample standard deviation over the mean; 0 when undefined.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt() / mean
}

pub fn hr_average(history: &SampleHistory, latest: u16) -> f64 {
    let n = history.heart_rate.len();
    if n == 0 {
        return f64::from(latest);
    }
    history.heart_rate.values().map(f64::from).sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Waypoint;
    use crate::route::MicroSegment;

    fn route(paces: &[f64]) -> Route {
        let waypoints = (0..=paces.len())
            .map(|k| Waypoint::new(48.0 + k as f64 * 0.001, 2.0))
            .collect();
        let segments = paces
            .iter()
            .enumerate()
            .map(|(k, &p)| MicroSegment {
                duration_ms: 1000,
                target_pace: p,
                end_distance_m: (k as f64 + 1.0) * 250.0,
            })
            .collect();
        Route::new(waypoints, segments).unwrap()
    }

    fn state(i: usize, pace: f64) -> SimulationState {
        SimulationState {
            segment_index: i,
            finished: false,
            elapsed_ms: 90_000,
            fraction: 0.0,
            position: Waypoint::new(48.0, 2.0),
            pace,
            heart_rate: 140,
        }
    }

    #[test]
    fn test_distances_and_gap() {
        let route = route(&[5.0, 5.0, 6.0, 6.0]);
        let history = SampleHistory::seeded(300, 5.0);
        let snap = aggregate(&route, &state(1, 5.3), &history);

        assert!((snap.done_km - 0.25).abs() < 1e-12);
        assert!((snap.remain_km - 0.75).abs() < 1e-12);
        assert_eq!(snap.pace_obj, 5.0);
        assert!((snap.pace_gap - 0.3).abs() < 1e-12);
        assert!((snap.time_run_min - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_lookahead_stops_at_regime_change() {
        let route = route(&[5.0, 5.0, 6.0, 6.0]);
        let history = SampleHistory::seeded(300, 5.0);
        let snap = aggregate(&route, &state(0, 5.5), &history);

        assert_eq!(next_pace_change(&route, 0), 2);
        assert!((snap.next_change_km - 0.5).abs() < 1e-12);
        assert!((snap.time_next_change_min - 2.75).abs() < 1e-12);
        assert!((snap.time_next_change_obj_min - 2.5).abs() < 1e-12);
        assert!((snap.eta_gap_min - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_lookahead_past_the_end_is_last_waypoint() {
        let route = route(&[5.0, 5.0, 6.0, 6.0]);
        assert_eq!(next_pace_change(&route, 3), 4);
        assert_eq!(next_pace_change(&route, 4), 4);
        assert_eq!(next_pace_change(&route, 99), 4);
    }

    #[test]
    fn test_constant_pace_lookahead_is_remaining_distance() {
        let route = route(&[6.0, 5.0, 5.0, 5.0]);
        let history = SampleHistory::seeded(300, 5.0);
        let real = 5.4;
        let snap = aggregate(&route, &state(1, real), &history);

        assert!((snap.next_change_km - snap.remain_km).abs() < 1e-12);
        assert!((snap.eta_gap_min - snap.remain_km * (real - 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_finished_snapshot() {
        let route = route(&[5.0, 6.0]);
        let history = SampleHistory::seeded(300, 5.0);
        let mut st = state(1, 5.9);
        st.finished = true;
        let snap = aggregate(&route, &st, &history);

        assert!(snap.finished);
        assert!((snap.done_km - 0.5).abs() < 1e-12);
        assert_eq!(snap.remain_km, 0.0);
        assert_eq!(snap.next_change_km, 0.0);
        assert_eq!(snap.pace_obj, 6.0);
    }

    #[test]
    fn test_cv_needs_three_samples() {
        let mut history = SampleHistory::seeded(300, 5.0);
        assert_eq!(pace_cv(&history), 0.0);

        history.record(5, 6.0, 130);
        assert_eq!(pace_cv(&history), 0.0);

        history.record(10, 7.0, 131);
        // mean 6, sample sd 1
        assert!((pace_cv(&history) - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_cv_is_scale_invariant() {
        let paces = [5.1, 4.9, 5.3, 5.0, 5.6, 4.7];
        let scaled: Vec<f64> = paces.iter().map(|p| p * 3.7).collect();
        let a = coefficient_of_variation(&paces);
        let b = coefficient_of_variation(&scaled);
        assert!(a > 0.0);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_hr_average_falls_back_to_latest() {
        let mut history = SampleHistory::seeded(300, 5.0);
        assert_eq!(hr_average(&history, 123), 123.0);

        history.record(5, 5.0, 130);
        history.record(10, 5.0, 140);
        assert_eq!(hr_average(&history, 140), 135.0);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let route = route(&[5.0, 5.5, 6.0]);
        let mut history = SampleHistory::seeded(300, 5.0);
        history.record(5, 5.2, 131);
        history.record(10, 5.4, 133);
        history.record(15, 5.3, 134);
        let st = state(1, 5.3);

        assert_eq!(aggregate(&route, &st, &history), aggregate(&route, &st, &history));
    }
}
