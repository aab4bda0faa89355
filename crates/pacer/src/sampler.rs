//! Stochastic pace and heart-rate signal.
//!
//! Pace follows a discrete mean-reverting walk toward the objective pace of
//! the current micro-segment. Heart rate is derived from the new pace and the
//! completed fraction of the race, plus noise and a slow wave.

use rand::Rng;

use crate::config::{HeartRateParams, SamplerParams};

/// Source of standard normal draws.
pub trait NoiseSource: Send {
    /// One draw from N(0, 1).
    fn standard_normal(&mut self) -> f64;
}

/// Box–Muller transform over a uniform generator.
pub struct BoxMuller<R> {
    rng: R,
}

impl<R: Rng + Send> BoxMuller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform in (0, 1); zero is re-drawn so `ln` stays finite.
    fn open_unit(&mut self) -> f64 {
        loop {
            let u: f64 = self.rng.r#gen();
            if u != 0.0 {
                return u;
            }
        }
    }
}

impl<R: Rng + Send> NoiseSource for BoxMuller<R> {
    fn standard_normal(&mut self) -> f64 {
        let u = self.open_unit();
        let v = self.open_unit();
        (-2.0 * u.ln()).sqrt() * (std::f64::consts::TAU * v).cos()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceNoise {
    draws: Vec<f64>,
    next: usize,
}

impl SequenceNoise {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, next: 0 }
    }

    /// Always draws zero.
    pub fn silent() -> Self {
        Self::new(vec![0.0])
    }
}

impl NoiseSource for SequenceNoise {
    fn standard_normal(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.next % self.draws.len()];
        self.next += 1;
        value
    }
}

/// One sampler output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysioSample {
    pub pace: f64,
    pub heart_rate: u16,
}

pub struct StochasticSampler {
    params: SamplerParams,
    noise: Box<dyn NoiseSource>,
}

impl StochasticSampler {
    pub fn new(params: SamplerParams, noise: Box<dyn NoiseSource>) -> Self {
        Self { params, noise }
    }

    pub fn params(&self) -> &SamplerParams {
        &self.params
    }

    /// Advances the pace and heart-rate processes by one step.
    pub fn sample(
        &mut self,
        current_pace: f64,
        objective_pace: f64,
        done_fraction: f64,
        elapsed_ms: u64,
    ) -> PhysioSample {
        let pace = self.next_pace(current_pace, objective_pace);
        let heart_rate = self.next_heart_rate(pace, done_fraction, elapsed_ms);
        PhysioSample { pace, heart_rate }
    }

    pub fn next_pace(&mut self, current_pace: f64, objective_pace: f64) -> f64 {
        let p = &self.params;
        let drift = p.reversion_rate * (objective_pace - current_pace);
        let noise = self.noise.standard_normal() * p.pace_noise_sd;
        let next = current_pace + drift + noise;

        if next.is_nan() {
            return p.min_pace.max(current_pace);
        }
        next.max(p.min_pace)
    }

    pub fn next_heart_rate(&mut self, pace: f64, done_fraction: f64, elapsed_ms: u64) -> u16 {
        let noise = self.noise.standard_normal();
        heart_rate_for(&self.params.heart_rate, pace, done_fraction, elapsed_ms, noise)
    }
}

/// Heart rate for a pace, completion fraction and standard normal draw.
pub fn heart_rate_for(
    hr: &HeartRateParams,
    pace: f64,
    done_fraction: f64,
    elapsed_ms: u64,
    standard_normal: f64,
) -> u16 {
    let base = hr.base_bpm
        + (hr.reference_pace - pace) * hr.pace_gain
        + done_fraction.clamp(0.0, 1.0) * hr.fatigue_gain;
    let wave = hr.wave_amplitude * (elapsed_ms as f64 / hr.wave_divisor_ms).sin();
    let raw = base + standard_normal * hr.noise_sd + wave;

    let (lo, hi) = (f64::from(hr.min_bpm), f64::from(hr.max_bpm));
    if raw.is_nan() {
        return hr.min_bpm;
    }
    // Total even for an inverted band, unlike clamp
    raw.max(lo).min(hi).round() as u16
}
