//! Maps elapsed race time onto the route.

use crate::models::Waypoint;
use crate::route::Route;

/// Where the runner is at a given elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockReading {
    Running {
        segment_index: usize,
        /// Progress through the current micro-segment, in [0, 1].
        fraction: f64,
        position: Waypoint,
    },
    Finished,
}

pub struct SimulationClock<'a> {
    route: &'a Route,
}

impl<'a> SimulationClock<'a> {
    pub fn new(route: &'a Route) -> Self {
        Self { route }
    }

    pub fn read(&self, elapsed_ms: u64) -> ClockReading {
        let ends = self.route.cumulative_times_ms();

        // Smallest i with ends[i] > elapsed
        let i = ends.partition_point(|&end| end <= elapsed_ms);
        if i == ends.len() {
            return ClockReading::Finished;
        }

        let start = if i == 0 { 0 } else { ends[i - 1] };
        let span = (ends[i] - start) as f64;
        let fraction = ((elapsed_ms - start) as f64 / span).clamp(0.0, 1.0);

        let waypoints = self.route.waypoints();
        let position = waypoints[i].lerp(&waypoints[i + 1], fraction);

        ClockReading::Running {
            segment_index: i,
            fraction,
            position,
        }
    }
}
