//! Procedural route generation.

use pacer::errors::RouteError;
use pacer::models::Waypoint;
use pacer::route::{PacedLeg, Route, RouteBuilder, haversine_m};
use rand::Rng;
use tracing::debug;

use crate::config::{BoundingBox, RouteConfig};
use crate::profiles::RunnerProfile;

/// Generates synthetic paced routes inside a bounding box.
pub struct ProceduralGenerator {
    config: RouteConfig,
}

impl Default for ProceduralGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProceduralGenerator {
    pub fn new() -> Self {
        Self {
            config: RouteConfig::default(),
        }
    }

    /// Creates a generator for a specific region.
    pub fn for_region(bounds: BoundingBox) -> Self {
        Self {
            config: RouteConfig {
                bounds,
                ..Default::default()
            },
        }
    }

    pub fn with_config(config: RouteConfig) -> Self {
        Self { config }
    }

    /// Sets the target distance.
    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_m = meters;
        self
    }

    /// Sets the starting point.
    pub fn with_start(mut self, lat: f64, lon: f64) -> Self {
        self.config.start = Some(Waypoint::new(lat, lon));
        self
    }

    /// Sets the length of each constant-pace leg.
    pub fn with_leg_length(mut self, meters: f64) -> Self {
        self.config.leg_m = meters;
        self
    }

    /// Sets point spacing.
    pub fn with_point_spacing(mut self, meters: f64) -> Self {
        self.config.point_spacing_m = meters;
        self
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Generates a route paced by `profile`, one target pace per leg.
    pub fn generate(&self, profile: &RunnerProfile, rng: &mut impl Rng) -> Result<Route, RouteError> {
        let start = self
            .config
            .start
            .unwrap_or_else(|| self.config.bounds.random_point(rng));

        let path = self.generate_path(start, rng);
        let legs = split_legs(&path, self.config.leg_m);
        let paces = profile.leg_paces(legs.len(), rng);
        debug!("Generated {} waypoints in {} legs", path.len(), legs.len());

        RouteBuilder::new()
            .legs(
                legs.into_iter()
                    .zip(paces)
                    .map(|(points, pace)| PacedLeg::new(points, pace)),
            )
            .build()
    }

    /// Generates the polyline alone.
    pub fn generate_path(&self, start: Waypoint, rng: &mut impl Rng) -> Vec<Waypoint> {
        let mut path = vec![start];
        let mut current = start;
        let mut total_distance = 0.0;

        // Random walk with some momentum to create natural-looking paths
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);

        while total_distance < self.config.distance_m {
            heading += rng.gen_range(-0.3..0.3);
            let step = self.config.point_spacing_m * rng.gen_range(0.8..1.2);

            // 1 degree of latitude is ~111 km; longitude shrinks with latitude
            let lat_delta = (step * heading.cos()) / 111_000.0;
            let lon_delta = (step * heading.sin()) / (111_000.0 * current.lat.to_radians().cos());

            let (next, bounced_heading) = self.apply_bounds(
                Waypoint::new(current.lat + lat_delta, current.lon + lon_delta),
                heading,
            );
            heading = bounced_heading;

            let length = haversine_m(&current, &next);
            if length <= 0.0 {
                continue;
            }
            total_distance += length;
            current = next;
            path.push(current);
        }

        path
    }

    /// Clamps to the bounds and turns the heading back inside.
    fn apply_bounds(&self, point: Waypoint, heading: f64) -> (Waypoint, f64) {
        let b = &self.config.bounds;
        let mut new_heading = heading;

        let lat = if point.lat < b.min_lat {
            new_heading = std::f64::consts::PI - new_heading;
            b.min_lat + (b.min_lat - point.lat).min(0.001)
        } else if point.lat > b.max_lat {
            new_heading = std::f64::consts::PI - new_heading;
            b.max_lat - (point.lat - b.max_lat).min(0.001)
        } else {
            point.lat
        };

        let lon = if point.lon < b.min_lon {
            new_heading = -new_heading;
            b.min_lon + (b.min_lon - point.lon).min(0.001)
        } else if point.lon > b.max_lon {
            new_heading = -new_heading;
            b.max_lon - (point.lon - b.max_lon).min(0.001)
        } else {
            point.lon
        };

        (Waypoint::new(lat, lon), new_heading)
    }
}

/// Cuts a polyline into legs of at least `leg_m` meters. Consecutive legs
/// share their joint waypoint; the last leg takes whatever remains.
pub fn split_legs(path: &[Waypoint], leg_m: f64) -> Vec<Vec<Waypoint>> {
    let Some(&first) = path.first() else {
        return Vec::new();
    };

    let mut legs = Vec::new();
    let mut leg = vec![first];
    let mut distance = 0.0;

    for pair in path.windows(2) {
        distance += haversine_m(&pair[0], &pair[1]);
        leg.push(pair[1]);
        if distance >= leg_m {
            legs.push(std::mem::replace(&mut leg, vec![pair[1]]));
            distance = 0.0;
        }
    }
    if leg.len() > 1 {
        legs.push(leg);
    }

    legs
}
