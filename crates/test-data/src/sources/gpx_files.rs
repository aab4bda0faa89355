//! GPX export of generated routes.

use std::io::Write;
use std::path::Path;

use geo::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment};
use pacer::route::Route;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GPX write error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

/// Writes a [`Route`] as a timed GPX 1.1 track.
///
/// Timestamps start at `start` and advance by each micro-segment's duration,
/// so reading the file back with recorded paces recovers the leg paces.
pub struct GpxWriter {
    start: OffsetDateTime,
    name: Option<String>,
}

impl Default for GpxWriter {
    fn default() -> Self {
        Self {
            start: OffsetDateTime::UNIX_EPOCH,
            name: None,
        }
    }
}

impl GpxWriter {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn to_gpx(&self, route: &Route) -> Gpx {
        let offsets = std::iter::once(0).chain(route.cumulative_times_ms().iter().copied());

        let points = route
            .waypoints()
            .iter()
            .zip(offsets)
            .map(|(wp, offset_ms)| {
                let mut point = gpx::Waypoint::new(Point::new(wp.lon, wp.lat));
                let at = self.start + Duration::milliseconds(offset_ms as i64);
                // Whole seconds only
                let at = OffsetDateTime::from_unix_timestamp(at.unix_timestamp())
                    .unwrap_or(OffsetDateTime::UNIX_EPOCH);
                point.time = Some(gpx::Time::from(at));
                point
            })
            .collect();

        let mut track = Track::new();
        track.name = self.name.clone();
        track.segments = vec![TrackSegment { points }];

        Gpx {
            version: GpxVersion::Gpx11,
            creator: Some("pacer test-data".to_string()),
            tracks: vec![track],
            ..Default::default()
        }
    }

    pub fn write(&self, route: &Route, writer: impl Write) -> Result<(), ExportError> {
        gpx::write(&self.to_gpx(route), writer)?;
        Ok(())
    }

    pub fn write_file(&self, route: &Route, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let file = std::fs::File::create(path)?;
        self.write(route, file)
    }
}
