//! Immutable course description: polyline, per-edge pace and timing.

use geo::{Distance as _, Haversine, Point};

use crate::errors::RouteError;
use crate::models::Waypoint;

/// Shortest traversal time allowed for one micro-segment.
pub const MIN_SEGMENT_DURATION_MS: u64 = 200;

/// Fastest pace a leg may be planned at (min/km).
pub const MIN_LEG_PACE: f64 = 3.0;

/// One edge of the polyline as supplied by a route source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicroSegment {
    pub duration_ms: u64,
    /// Target pace in min/km.
    pub target_pace: f64,
    /// Cumulative distance at the end of this edge, in meters.
    pub end_distance_m: f64,
}

/// A validated, read-only route.
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<Waypoint>,
    paces: Vec<f64>,
    durations_ms: Vec<u64>,
    /// Length N; `cumulative_m[0] == 0`.
    cumulative_m: Vec<f64>,
    /// Length N-1; end time of each micro-segment.
    cumulative_time_ms: Vec<u64>,
}

impl Route {
    pub fn new(waypoints: Vec<Waypoint>, segments: Vec<MicroSegment>) -> Result<Self, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::TooFewWaypoints(waypoints.len()));
        }
        if segments.len() != waypoints.len() - 1 {
            return Err(RouteError::SegmentCountMismatch {
                expected: waypoints.len() - 1,
                actual: segments.len(),
            });
        }

        let mut paces = Vec::with_capacity(segments.len());
        let mut durations_ms = Vec::with_capacity(segments.len());
        let mut cumulative_m = Vec::with_capacity(waypoints.len());
        let mut cumulative_time_ms = Vec::with_capacity(segments.len());
        cumulative_m.push(0.0);
        let mut elapsed = 0u64;

        for (index, seg) in segments.iter().enumerate() {
            if seg.duration_ms < MIN_SEGMENT_DURATION_MS {
                return Err(RouteError::DurationTooShort {
                    index,
                    duration_ms: seg.duration_ms,
                    floor_ms: MIN_SEGMENT_DURATION_MS,
                });
            }
            if !seg.target_pace.is_finite() || seg.target_pace <= 0.0 {
                return Err(RouteError::InvalidPace {
                    index,
                    pace: seg.target_pace,
                });
            }
            let prev = cumulative_m[index];
            if !seg.end_distance_m.is_finite() || seg.end_distance_m <= prev {
                return Err(RouteError::NonIncreasingDistance { index });
            }

            elapsed += seg.duration_ms;
            paces.push(seg.target_pace);
            durations_ms.push(seg.duration_ms);
            cumulative_m.push(seg.end_distance_m);
            cumulative_time_ms.push(elapsed);
        }

        Ok(Self {
            waypoints,
            paces,
            durations_ms,
            cumulative_m,
            cumulative_time_ms,
        })
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Number of micro-segments (N-1).
    pub fn segment_count(&self) -> usize {
        self.paces.len()
    }

    pub fn objective_pace(&self, index: usize) -> f64 {
        self.paces[index.min(self.paces.len() - 1)]
    }

    pub fn paces(&self) -> &[f64] {
        &self.paces
    }

    pub fn durations_ms(&self) -> &[u64] {
        &self.durations_ms
    }

    /// Distance from the start to waypoint `index`, in meters.
    pub fn distance_at(&self, index: usize) -> f64 {
        self.cumulative_m[index.min(self.cumulative_m.len() - 1)]
    }

    pub fn cumulative_distances(&self) -> &[f64] {
        &self.cumulative_m
    }

    pub fn cumulative_times_ms(&self) -> &[u64] {
        &self.cumulative_time_ms
    }

    pub fn total_distance_m(&self) -> f64 {
        self.cumulative_m[self.cumulative_m.len() - 1]
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.cumulative_time_ms[self.cumulative_time_ms.len() - 1]
    }

    /// Mean planned pace over the whole route (min/km).
    pub fn mean_pace(&self) -> f64 {
        let total_min = self.total_duration_ms() as f64 / 60_000.0;
        let total_km = self.total_distance_m() / 1000.0;
        total_min / total_km
    }
}

/// A routed polyline to be run at one target pace.
#[derive(Debug, Clone)]
pub struct PacedLeg {
    pub points: Vec<Waypoint>,
    /// Target pace in min/km.
    pub pace: f64,
}

impl PacedLeg {
    pub fn new(points: Vec<Waypoint>, pace: f64) -> Self {
        Self { points, pace }
    }
}

/// Assembles a [`Route`] from consecutive paced legs.
#[derive(Debug, Default)]
pub struct RouteBuilder {
    legs: Vec<PacedLeg>,
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leg(mut self, points: Vec<Waypoint>, pace: f64) -> Self {
        self.legs.push(PacedLeg::new(points, pace));
        self
    }

    pub fn legs(mut self, legs: impl IntoIterator<Item = PacedLeg>) -> Self {
        self.legs.extend(legs);
        self
    }

    pub fn build(self) -> Result<Route, RouteError> {
        let mut line: Vec<Waypoint> = Vec::new();
        let mut segments = Vec::new();
        let mut distance = 0.0;

        for (index, leg) in self.legs.iter().enumerate() {
            if !leg.pace.is_finite() || leg.pace < MIN_LEG_PACE {
                return Err(RouteError::PaceBelowFloor {
                    index,
                    pace: leg.pace,
                    floor: MIN_LEG_PACE,
                });
            }

            // min/km -> ms per meter
            let ms_per_m = leg.pace * 60.0;

            for point in &leg.points {
                let Some(prev) = line.last().copied() else {
                    line.push(*point);
                    continue;
                };

                let length = haversine_m(&prev, point);
                if length <= 0.0 {
                    // Repeated point, including the joint between two legs
                    continue;
                }

                distance += length;
                let duration_ms = ((length * ms_per_m).round() as u64).max(MIN_SEGMENT_DURATION_MS);
                segments.push(MicroSegment {
                    duration_ms,
                    target_pace: leg.pace,
                    end_distance_m: distance,
                });
                line.push(*point);
            }
        }

        Route::new(line, segments)
    }
}

/// Great-circle distance between two waypoints in meters.
pub fn haversine_m(a: &Waypoint, b: &Waypoint) -> f64 {
    Haversine.distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_segment_route() -> Route {
        Route::new(
            vec![
                Waypoint::new(48.0, 2.0),
                Waypoint::new(48.001, 2.0),
                Waypoint::new(48.002, 2.0),
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
        .unwrap()
    }

    #[test]
    fn test_route_tables() {
        let route = two_segment_route();
        assert_eq!(route.segment_count(), 2);
        assert_eq!(route.cumulative_distances(), &[0.0, 200.0, 500.0]);
        assert_eq!(route.cumulative_times_ms(), &[1000, 3000]);
        assert_eq!(route.total_duration_ms(), 3000);
        assert!((route.total_distance_m() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_single_waypoint() {
        let err = Route::new(vec![Waypoint::new(48.0, 2.0)], vec![]).unwrap_err();
        assert!(matches!(err, RouteError::TooFewWaypoints(1)));

        let err = Route::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, RouteError::TooFewWaypoints(0)));
    }

    #[test]
    fn test_rejects_short_duration() {
        let err = Route::new(
            vec![Waypoint::new(48.0, 2.0), Waypoint::new(48.001, 2.0)],
            vec![MicroSegment {
                duration_ms: 0,
                target_pace: 5.0,
                end_distance_m: 100.0,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::DurationTooShort { index: 0, .. }));
    }

    #[test]
    fn test_rejects_non_increasing_distance() {
        let err = Route::new(
            vec![
                Waypoint::new(48.0, 2.0),
                Waypoint::new(48.001, 2.0),
                Waypoint::new(48.002, 2.0),
            ],
            vec![
                MicroSegment {
                    duration_ms: 500,
                    target_pace: 5.0,
                    end_distance_m: 100.0,
                },
                MicroSegment {
                    duration_ms: 500,
                    target_pace: 5.0,
                    end_distance_m: 100.0,
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::NonIncreasingDistance { index: 1 }));
    }

    #[test]
    fn test_rejects_non_positive_pace() {
        let err = Route::new(
            vec![Waypoint::new(48.0, 2.0), Waypoint::new(48.001, 2.0)],
            vec![MicroSegment {
                duration_ms: 500,
                target_pace: 0.0,
                end_distance_m: 100.0,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidPace { index: 0, .. }));
    }

    #[test]
    fn test_rejects_segment_count_mismatch() {
        let err = Route::new(
            vec![Waypoint::new(48.0, 2.0), Waypoint::new(48.001, 2.0)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RouteError::SegmentCountMismatch {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_builder_joins_legs_without_duplicate_point() {
        let a = Waypoint::new(48.8600, 2.3500);
        let b = Waypoint::new(48.8610, 2.3500);
        let c = Waypoint::new(48.8620, 2.3500);

        let route = RouteBuilder::new()
            .leg(vec![a, b], 5.0)
            .leg(vec![b, c], 4.0)
            .build()
            .unwrap();

        assert_eq!(route.waypoints().len(), 3);
        assert_eq!(route.paces(), &[5.0, 4.0]);

        // ~111 m per 0.001 degree of latitude
        let first = route.distance_at(1);
        assert!((first - 111.2).abs() < 1.0);

        // 5:00/km over ~111 m is ~33.4 s
        let dur = route.durations_ms()[0] as f64;
        assert!((dur - first * 5.0 * 60.0).abs() <= 1.0);
    }

    #[test]
    fn test_builder_floors_duration() {
        let a = Waypoint::new(48.86, 2.35);
        let b = Waypoint::new(48.860001, 2.35);
        let route = RouteBuilder::new().leg(vec![a, b], 3.0).build().unwrap();
        assert_eq!(route.durations_ms()[0], MIN_SEGMENT_DURATION_MS);
    }

    #[test]
    fn test_builder_rejects_fast_leg() {
        let a = Waypoint::new(48.86, 2.35);
        let b = Waypoint::new(48.87, 2.35);
        let err = RouteBuilder::new().leg(vec![a, b], 2.5).build().unwrap_err();
        assert!(matches!(err, RouteError::PaceBelowFloor { index: 0, .. }));
    }

    #[test]
    fn test_builder_rejects_empty() {
        let err = RouteBuilder::new().build().unwrap_err();
        assert!(matches!(err, RouteError::TooFewWaypoints(0)));
    }

    #[test]
    fn test_mean_pace_of_steady_route() {
        let route = RouteBuilder::new()
            .leg(
                vec![Waypoint::new(48.86, 2.35), Waypoint::new(48.87, 2.35)],
                5.0,
            )
            .build()
            .unwrap();
        assert!((route.mean_pace() - 5.0).abs() < 0.001);
    }
}
