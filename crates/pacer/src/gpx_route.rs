//! Builds a [`Route`] from a GPX track.

use std::path::Path;

use gpx::{Gpx, read};
use time::OffsetDateTime;

use crate::errors::RouteError;
use crate::models::Waypoint;
use crate::route::{MIN_LEG_PACE, PacedLeg, Route, RouteBuilder, haversine_m};

/// How target paces are assigned to a GPX polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaceSource {
    /// One pace for the whole track (min/km).
    Constant(f64),
    /// Paces derived from the recorded timestamps, averaged per bucket.
    Recorded { bucket_m: f64 },
}

impl PaceSource {
    pub fn recorded() -> Self {
        PaceSource::Recorded { bucket_m: 1000.0 }
    }
}

#[derive(Debug, Clone)]
struct TrackPoint {
    at: Waypoint,
    timestamp: Option<OffsetDateTime>,
}

pub fn load_file(path: impl AsRef<Path>, pace: PaceSource) -> Result<Route, RouteError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let gpx: Gpx = read(reader)?;
    from_gpx(&gpx, pace)
}

pub fn load_bytes(data: &[u8], pace: PaceSource) -> Result<Route, RouteError> {
    let gpx: Gpx = read(std::io::Cursor::new(data))?;
    from_gpx(&gpx, pace)
}

pub fn from_gpx(gpx: &Gpx, pace: PaceSource) -> Result<Route, RouteError> {
    let points = extract_points(gpx)?;

    let legs = match pace {
        PaceSource::Constant(minutes_per_km) => {
            let line = points.iter().map(|p| p.at).collect();
            vec![PacedLeg::new(line, minutes_per_km)]
        }
        PaceSource::Recorded { bucket_m } => recorded_legs(&points, bucket_m)?,
    };

    RouteBuilder::new().legs(legs).build()
}

fn extract_points(gpx: &Gpx) -> Result<Vec<TrackPoint>, RouteError> {
    let mut points = Vec::new();

    for track in &gpx.tracks {
        for segment in &track.segments {
            for waypoint in &segment.points {
                let point = waypoint.point();
                points.push(TrackPoint {
                    at: Waypoint::new(point.y(), point.x()),
                    timestamp: waypoint.time.map(OffsetDateTime::from),
                });
            }
        }
    }

    if points.is_empty() {
        return Err(RouteError::NoTrackPoints);
    }
    Ok(points)
}

/// Splits the track into distance buckets, each run at its recorded pace.
fn recorded_legs(points: &[TrackPoint], bucket_m: f64) -> Result<Vec<PacedLeg>, RouteError> {
    let bucket_m = if bucket_m > 0.0 { bucket_m } else { 1000.0 };

    let mut stamps = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        stamps.push(p.timestamp.ok_or(RouteError::MissingTimestamp(i))?);
    }

    let mut legs = Vec::new();
    let mut leg_points = vec![points[0].at];
    let mut leg_distance = 0.0;
    let mut leg_start = stamps[0];

    for i in 1..points.len() {
        leg_distance += haversine_m(&points[i - 1].at, &points[i].at);
        leg_points.push(points[i].at);

        let last = i == points.len() - 1;
        if leg_distance >= bucket_m || last {
            let minutes = (stamps[i] - leg_start).as_seconds_f64() / 60.0;
            let pace = bucket_pace(minutes, leg_distance);
            legs.push(PacedLeg::new(std::mem::take(&mut leg_points), pace));

            leg_points.push(points[i].at);
            leg_distance = 0.0;
            leg_start = stamps[i];
        }
    }

    Ok(legs)
}

fn bucket_pace(minutes: f64, distance_m: f64) -> f64 {
    if distance_m <= 0.0 || minutes <= 0.0 {
        return MIN_LEG_PACE;
    }
    let pace = minutes / (distance_m / 1000.0);
    ((pace * 100.0).round() / 100.0).max(MIN_LEG_PACE)
}
