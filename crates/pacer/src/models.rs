use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::splits::KmSplitSummary;

/// Sentinel the coaching service uses for "nothing to say now".
pub const NO_TIP: &str = "NO_TIP";

/// A node of the route polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
}

impl Waypoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Linear interpolation in latitude and longitude independently.
    pub fn lerp(&self, other: &Waypoint, t: f64) -> Waypoint {
        Waypoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// One timestamped history entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    /// Whole seconds since race start.
    pub t: u64,
    pub value: T,
}

/// Derived metrics at one point in time. Always built fresh, never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub segment_index: usize,
    pub finished: bool,
    pub elapsed_ms: u64,
    pub done_km: f64,
    pub remain_km: f64,
    pub pace_obj: f64,
    pub pace_now: f64,
    /// Mean objective pace of the whole route.
    pub pace_avg: f64,
    pub pace_gap: f64,
    pub next_change_km: f64,
    pub time_next_change_min: f64,
    pub time_next_change_obj_min: f64,
    pub eta_gap_min: f64,
    pub pace_cv: f64,
    pub heart_rate: u16,
    pub hr_avg: f64,
    pub time_run_min: f64,
}

/// Wire payload posted to the coaching service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryTick {
    pub race_id: Uuid,
    pub done_km: f64,
    pub remain_km: f64,
    pub pace_now: f64,
    pub next_change_km: f64,
    pub pace_obj: f64,
    pub pace_avg: f64,
    pub pace_gap: f64,
    pub time_next_change_min: f64,
    pub time_next_change_obj_min: f64,
    pub time_run_min: f64,
    pub eta_gap_min: f64,
    pub pace_cv: f64,
    pub heart_rate: u16,
    pub hr_avg: f64,
}

impl TelemetryTick {
    pub fn from_snapshot(race_id: Uuid, snapshot: &MetricsSnapshot) -> Self {
        Self {
            race_id,
            done_km: snapshot.done_km,
            remain_km: snapshot.remain_km,
            pace_now: snapshot.pace_now,
            next_change_km: snapshot.next_change_km,
            pace_obj: snapshot.pace_obj,
            pace_avg: snapshot.pace_avg,
            pace_gap: snapshot.pace_gap,
            time_next_change_min: snapshot.time_next_change_min,
            time_next_change_obj_min: snapshot.time_next_change_obj_min,
            time_run_min: snapshot.time_run_min,
            eta_gap_min: snapshot.eta_gap_min,
            pace_cv: snapshot.pace_cv,
            heart_rate: snapshot.heart_rate,
            hr_avg: snapshot.hr_avg,
        }
    }
}

/// Raw reply body of the coaching service.
#[derive(Debug, Clone, Deserialize)]
pub struct CoachReply {
    pub message: String,
}

/// Decoded coaching reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advice {
    Tip(String),
    NoTip,
}

impl Advice {
    /// Decodes the sentinel convention once, at the boundary.
    pub fn from_message(message: &str) -> Self {
        let trimmed = message.trim();
        if trimmed.is_empty() || trimmed == NO_TIP {
            Advice::NoTip
        } else {
            Advice::Tip(trimmed.to_string())
        }
    }
}

impl From<CoachReply> for Advice {
    fn from(reply: CoachReply) -> Self {
        Advice::from_message(&reply.message)
    }
}

/// What the advice display currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdviceState {
    #[default]
    Idle,
    Showing(String),
}

/// End-of-race notification body.
#[derive(Debug, Clone, Serialize)]
pub struct RaceSummary {
    pub race_id: Uuid,
    pub finished: bool,
    pub elapsed_ms: u64,
    pub done_km: f64,
    pub splits: Vec<KmSplitSummary>,
    /// Unix timestamp (seconds) at which the race was reset.
    pub ended_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_decodes_to_no_tip() {
        assert_eq!(Advice::from_message("NO_TIP"), Advice::NoTip);
        assert_eq!(Advice::from_message("  NO_TIP\n"), Advice::NoTip);
        assert_eq!(Advice::from_message(""), Advice::NoTip);
        assert_eq!(Advice::from_message("   "), Advice::NoTip);
    }

    #[test]
    fn test_text_decodes_to_tip() {
        assert_eq!(
            Advice::from_message("Ease off a little"),
            Advice::Tip("Ease off a little".to_string())
        );
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Waypoint::new(48.0, 2.0);
        let b = Waypoint::new(49.0, 3.0);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.lat - 48.5).abs() < 1e-12);
        assert!((mid.lon - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_tick_serializes_contract_fields() {
        let snapshot = MetricsSnapshot {
            segment_index: 3,
            finished: false,
            elapsed_ms: 60_000,
            done_km: 1.2,
            remain_km: 3.8,
            pace_obj: 5.0,
            pace_now: 5.1,
            pace_avg: 5.2,
            pace_gap: 0.1,
            next_change_km: 0.8,
            time_next_change_min: 4.08,
            time_next_change_obj_min: 4.0,
            eta_gap_min: 0.08,
            pace_cv: 0.01,
            heart_rate: 141,
            hr_avg: 138.5,
            time_run_min: 1.0,
        };
        let tick = TelemetryTick::from_snapshot(Uuid::nil(), &snapshot);
        let json = serde_json::to_value(&tick).unwrap();

        for field in [
            "done_km",
            "remain_km",
            "pace_now",
            "pace_obj",
            "pace_avg",
            "heart_rate",
            "pace_gap",
            "eta_gap_min",
            "pace_cv",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["heart_rate"], 141);
    }
}
