//! Configuration types for route generation.

use pacer::models::Waypoint;
use serde::{Deserialize, Serialize};

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> Waypoint {
        let lat = rng.gen_range(self.min_lat..self.max_lat);
        let lon = rng.gen_range(self.min_lon..self.max_lon);
        Waypoint::new(lat, lon)
    }

    pub fn center(&self) -> Waypoint {
        Waypoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, point: &Waypoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

/// Pre-defined geographic regions.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Central Paris, inside the ring road.
    pub const PARIS: BoundingBox = BoundingBox::new(48.815, 2.255, 48.900, 2.415);

    /// Boulder, CO area.
    pub const BOULDER: BoundingBox = BoundingBox::new(39.9, -105.5, 40.1, -105.2);

    /// Looks a region up by name, case-insensitively.
    pub fn by_name(name: &str) -> Option<BoundingBox> {
        match name.to_ascii_lowercase().as_str() {
            "paris" => Some(Self::PARIS),
            "boulder" => Some(Self::BOULDER),
            _ => None,
        }
    }
}

/// Shape of a generated route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Target distance in meters.
    pub distance_m: f64,
    /// Length of each constant-pace leg in meters.
    pub leg_m: f64,
    /// Approximate distance between waypoints in meters.
    pub point_spacing_m: f64,
    /// Geographic bounds for the polyline.
    pub bounds: BoundingBox,
    /// Starting point. If None, random within bounds.
    pub start: Option<Waypoint>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            distance_m: 5000.0,
            leg_m: 1000.0,
            point_spacing_m: 25.0,
            bounds: Region::PARIS,
            start: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_point_inside_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let p = Region::PARIS.random_point(&mut rng);
            assert!(Region::PARIS.contains(&p));
        }
    }

    #[test]
    fn test_region_lookup() {
        assert_eq!(Region::by_name("Paris"), Some(Region::PARIS));
        assert_eq!(Region::by_name("boulder"), Some(Region::BOULDER));
        assert_eq!(Region::by_name("atlantis"), None);
    }
}
