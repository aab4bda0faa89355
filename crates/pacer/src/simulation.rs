//! Single-owner race state advanced by the animation and sample ticks.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::clock::{ClockReading, SimulationClock};
use crate::config::SimulationConfig;
use crate::history::SampleHistory;
use crate::metrics;
use crate::models::{MetricsSnapshot, Waypoint};
use crate::route::Route;
use crate::sampler::{NoiseSource, StochasticSampler};
use crate::splits::{KmSplitSummary, KmSplits};

/// Mutable state of one race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationState {
    pub segment_index: usize,
    pub finished: bool,
    pub elapsed_ms: u64,
    pub fraction: f64,
    pub position: Waypoint,
    pub pace: f64,
    pub heart_rate: u16,
}

/// Result of one animation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationOutcome {
    Moved {
        segment_index: usize,
        fraction: f64,
        position: Waypoint,
    },
    /// Reported once, on the tick that crosses the finish.
    JustFinished,
    AlreadyFinished,
}

pub struct Simulation {
    route: Arc<Route>,
    config: SimulationConfig,
    state: SimulationState,
    history: SampleHistory,
    splits: KmSplits,
    sampler: StochasticSampler,
}

impl Simulation {
    pub fn new(route: Arc<Route>, config: SimulationConfig, noise: Box<dyn NoiseSource>) -> Self {
        let initial_pace = route.objective_pace(0);
        let start = route.waypoints()[0];
        let state = SimulationState {
            segment_index: 0,
            finished: false,
            elapsed_ms: 0,
            fraction: 0.0,
            position: start,
            pace: initial_pace,
            heart_rate: config.sampler.heart_rate.resting_bpm,
        };
        let history = SampleHistory::seeded(config.history_capacity, initial_pace);
        let splits = KmSplits::new(config.split_section_m);
        let sampler = StochasticSampler::new(config.sampler.clone(), noise);

        Self {
            route,
            config,
            state,
            history,
            splits,
            sampler,
        }
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn splits(&self) -> Vec<KmSplitSummary> {
        self.splits.summaries()
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    /// Moves the runner to `elapsed_ms`.
    ///
    /// Elapsed time never runs backwards here, so the segment index is
    /// non-decreasing across the race.
    pub fn on_animation_tick(&mut self, elapsed_ms: u64) -> AnimationOutcome {
        if self.state.finished {
            return AnimationOutcome::AlreadyFinished;
        }

        let elapsed_ms = elapsed_ms.max(self.state.elapsed_ms);
        self.state.elapsed_ms = elapsed_ms;

        match SimulationClock::new(&self.route).read(elapsed_ms) {
            ClockReading::Running {
                segment_index,
                fraction,
                position,
            } => {
                let segment_index = segment_index.max(self.state.segment_index);
                self.state.segment_index = segment_index;
                self.state.fraction = fraction;
                self.state.position = position;
                AnimationOutcome::Moved {
                    segment_index,
                    fraction,
                    position,
                }
            }
            ClockReading::Finished => {
                let waypoints = self.route.waypoints();
                self.state.finished = true;
                self.state.segment_index = self.route.segment_count() - 1;
                self.state.fraction = 1.0;
                self.state.position = waypoints[waypoints.len() - 1];
                info!(
                    "Race finished after {:.1}s ({:.2} km)",
                    elapsed_ms as f64 / 1000.0,
                    self.route.total_distance_m() / 1000.0
                );
                AnimationOutcome::JustFinished
            }
        }
    }

    /// Draws a new pace/heart-rate sample against the position of the most
    /// recent animation tick. Returns `None` once the race is finished.
    pub fn on_sample_tick(&mut self, elapsed_ms: u64) -> Option<MetricsSnapshot> {
        if self.state.finished {
            return None;
        }

        let elapsed_ms = elapsed_ms.max(self.state.elapsed_ms);
        let i = self.state.segment_index;
        let done_m = self.route.distance_at(i);
        let done_fraction = done_m / self.route.total_distance_m();

        let sample = self.sampler.sample(
            self.state.pace,
            self.route.objective_pace(i),
            done_fraction,
            elapsed_ms,
        );
        self.state.pace = sample.pace;
        self.state.heart_rate = sample.heart_rate;

        let t = elapsed_ms / 1000;
        self.history.record(t, sample.pace, sample.heart_rate);
        self.splits.add_sample(done_m, sample.pace, Some(sample.heart_rate));

        debug!(
            "Sample t={}s segment={} pace={:.3} hr={}",
            t, i, sample.pace, sample.heart_rate
        );

        Some(self.snapshot())
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        metrics::aggregate(&self.route, &self.state, &self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::MicroSegment;
    use crate::sampler::SequenceNoise;

    fn route() -> Arc<Route> {
        Arc::new(
            Route::new(
                vec![
                    Waypoint::new(48.0, 2.0),
                    Waypoint::new(48.002, 2.0),
                    Waypoint::new(48.002, 2.004),
                ],
                vec![
                    MicroSegment {
                        duration_ms: 1000,
                        target_pace: 5.0,
                        end_distance_m: 200.0,
                    },
                    MicroSegment {
                        duration_ms: 2000,
                        target_pace: 6.0,
                        end_distance_m: 500.0,
                    },
                ],
            )
            .unwrap(),
        )
    }

    fn simulation() -> Simulation {
        Simulation::new(
            route(),
            SimulationConfig::default(),
            Box::new(SequenceNoise::silent()),
        )
    }

    #[test]
    fn test_initial_state() {
        let sim = simulation();
        assert_eq!(sim.state().segment_index, 0);
        assert_eq!(sim.state().pace, 5.0);
        assert_eq!(sim.state().heart_rate, 120);
        assert_eq!(sim.history().pace.len(), 1);
        assert!(sim.history().heart_rate.is_empty());
    }

    #[test]
    fn test_finish_reported_once() {
        let mut sim = simulation();

        assert!(matches!(
            sim.on_animation_tick(500),
            AnimationOutcome::Moved { segment_index: 0, .. }
        ));
        assert!(matches!(
            sim.on_animation_tick(1500),
            AnimationOutcome::Moved { segment_index: 1, .. }
        ));
        assert_eq!(sim.on_animation_tick(3000), AnimationOutcome::JustFinished);
        assert_eq!(sim.on_animation_tick(3200), AnimationOutcome::AlreadyFinished);
        assert_eq!(sim.on_animation_tick(9000), AnimationOutcome::AlreadyFinished);

        assert!(sim.is_finished());
        assert_eq!(sim.state().position, Waypoint::new(48.002, 2.004));
    }

    #[test]
    fn test_index_never_regresses() {
        let mut sim = simulation();
        sim.on_animation_tick(1500);
        // A stale elapsed value does not move the runner back
        sim.on_animation_tick(400);
        assert_eq!(sim.state().segment_index, 1);
        assert_eq!(sim.state().elapsed_ms, 1500);
    }

    #[test]
    fn test_sample_uses_last_animation_position() {
        let mut sim = simulation();
        sim.on_animation_tick(1200);

        // Without noise the pace moves a quarter of the way to 6.0
        let snap = sim.on_sample_tick(1250).unwrap();
        assert_eq!(snap.segment_index, 1);
        assert!((snap.pace_now - 5.25).abs() < 1e-12);
        assert_eq!(sim.history().pace.len(), 2);
        assert_eq!(sim.history().heart_rate.len(), 1);
        assert_eq!(sim.splits().len(), 1);
    }

    #[test]
    fn test_no_samples_after_finish() {
        let mut sim = simulation();
        sim.on_animation_tick(5000);
        assert!(sim.on_sample_tick(5000).is_none());
        assert_eq!(sim.history().pace.len(), 1);

        let snap = sim.snapshot();
        assert!(snap.finished);
        assert_eq!(snap.remain_km, 0.0);
    }
}
