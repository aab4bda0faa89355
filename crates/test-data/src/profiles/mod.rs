//! Runner pace profiles.
//!
//! A profile turns a number of legs into a list of target paces. Generators
//! pair those paces with polyline legs to build a route.

mod runner;

pub use runner::{PacePlan, RunnerProfile};

use pacer::route::MIN_LEG_PACE;

/// Samples a variance factor from a normal distribution.
/// Returns a multiplier around 1.0.
pub fn sample_variance(std_dev: f64, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    if std_dev > 0.0
        && let Ok(normal) = Normal::new(1.0, std_dev)
    {
        let sample: f64 = normal.sample(rng);
        sample.clamp(0.8, 1.25)
    } else {
        1.0
    }
}

/// Rounds a pace to 0.1 min/km, never faster than the route floor.
pub fn round_pace(pace: f64) -> f64 {
    ((pace * 10.0).round() / 10.0).max(MIN_LEG_PACE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_variance_stays_clamped() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let v = sample_variance(0.5, &mut rng);
            assert!((0.8..=1.25).contains(&v));
        }
        assert_eq!(sample_variance(0.0, &mut rng), 1.0);
    }

    #[test]
    fn test_round_pace() {
        assert_eq!(round_pace(5.04), 5.0);
        assert_eq!(round_pace(5.06), 5.1);
        assert_eq!(round_pace(2.4), 3.0);
    }
}
