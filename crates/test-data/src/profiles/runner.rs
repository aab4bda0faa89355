//! Runner pace profile.

use rand::Rng;

use super::{round_pace, sample_variance};

/// How the target pace evolves from leg to leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PacePlan {
    /// Same pace throughout.
    Steady,
    /// Starts `spread` min/km slower than base and finishes `spread` faster.
    NegativeSplit { spread: f64 },
    /// Alternates fast and recovery legs around the base pace.
    Intervals { fast: f64, recovery: f64 },
}

impl PacePlan {
    pub fn negative_split() -> Self {
        Self::NegativeSplit { spread: 0.3 }
    }

    pub fn intervals() -> Self {
        Self::Intervals {
            fast: 0.8,
            recovery: 1.0,
        }
    }

    /// Looks a plan up by name, with default parameters.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "steady" => Some(Self::Steady),
            "negative" | "negative-split" => Some(Self::negative_split()),
            "intervals" => Some(Self::intervals()),
            _ => None,
        }
    }
}

/// Runner with a base pace, a plan and some leg-to-leg variance.
///
/// Based on a typical recreational runner:
/// - Base pace: 5:00/km
/// - Leg-to-leg variance: ~3%
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    /// Base pace in min/km.
    base_pace: f64,
    /// Leg-to-leg variance (coefficient of variation).
    variance: f64,
    plan: PacePlan,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self {
            base_pace: 5.0,
            variance: 0.03,
            plan: PacePlan::Steady,
        }
    }
}

impl RunnerProfile {
    /// Creates a runner with the given base pace in min/km.
    pub fn with_pace(pace_min_per_km: f64) -> Self {
        Self {
            base_pace: pace_min_per_km,
            ..Default::default()
        }
    }

    /// Elite runner (~3:30/km).
    pub fn elite() -> Self {
        Self::with_pace(3.5)
    }

    /// Recreational runner (~6:00/km).
    pub fn recreational() -> Self {
        Self::with_pace(6.0)
    }

    pub fn plan(mut self, plan: PacePlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn variance(mut self, variance: f64) -> Self {
        self.variance = variance.max(0.0);
        self
    }

    pub fn base_pace(&self) -> f64 {
        self.base_pace
    }

    /// Planned pace of leg `index` out of `legs`, before variance.
    pub fn planned_pace(&self, index: usize, legs: usize) -> f64 {
        match self.plan {
            PacePlan::Steady => self.base_pace,
            PacePlan::NegativeSplit { spread } => {
                if legs < 2 {
                    return self.base_pace;
                }
                // Linear from base + spread down to base - spread
                let progress = index as f64 / (legs - 1) as f64;
                self.base_pace + spread * (1.0 - 2.0 * progress)
            }
            PacePlan::Intervals { fast, recovery } => {
                if index % 2 == 0 {
                    self.base_pace + recovery
                } else {
                    self.base_pace - fast
                }
            }
        }
    }

    /// Draws one target pace per leg.
    pub fn leg_paces(&self, legs: usize, rng: &mut impl Rng) -> Vec<f64> {
        (0..legs)
            .map(|i| round_pace(self.planned_pace(i, legs) * sample_variance(self.variance, rng)))
            .collect()
    }
}
