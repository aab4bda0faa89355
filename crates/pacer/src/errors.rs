use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Route needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("Expected {expected} micro-segments for the polyline, got {actual}")]
    SegmentCountMismatch { expected: usize, actual: usize },

    #[error("Micro-segment {index} lasts {duration_ms} ms, below the {floor_ms} ms floor")]
    DurationTooShort {
        index: usize,
        duration_ms: u64,
        floor_ms: u64,
    },

    #[error("Micro-segment {index} has an invalid target pace: {pace}")]
    InvalidPace { index: usize, pace: f64 },

    #[error("Leg {index} pace {pace} min/km is faster than the {floor} min/km floor")]
    PaceBelowFloor { index: usize, pace: f64, floor: f64 },

    #[error("Cumulative distance must strictly increase (micro-segment {index})")]
    NonIncreasingDistance { index: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPX parse error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("No track points found in GPX file")]
    NoTrackPoints,

    #[error("Track point {0} has no timestamp")]
    MissingTimestamp(usize),
}

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Coaching service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed coaching reply: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum AskError {
    #[error(transparent)]
    Coach(#[from] CoachError),

    #[error("Race has been reset")]
    RaceGone,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("Reversion rate must lie in [0, 1], got {0}")]
    ReversionOutOfRange(f64),

    #[error("Heart-rate band is inverted: min {min} > max {max}")]
    InvertedHeartRateBand { min: u16, max: u16 },
}
