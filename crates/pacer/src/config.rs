//! Tunable parameters for the simulation and the coaching client.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Parameters of the heart-rate model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateParams {
    /// Heart rate at reference pace at the start line.
    pub base_bpm: f64,
    /// Pace (min/km) at which the pace term is zero.
    pub reference_pace: f64,
    /// bpm added per min/km faster than the reference pace.
    pub pace_gain: f64,
    /// bpm added at full race completion.
    pub fatigue_gain: f64,
    /// Standard deviation of the per-sample noise (bpm).
    pub noise_sd: f64,
    /// Amplitude of the slow sinusoidal wave (bpm).
    pub wave_amplitude: f64,
    /// The wave is `sin(elapsed_ms / wave_divisor_ms)`.
    pub wave_divisor_ms: f64,
    pub min_bpm: u16,
    pub max_bpm: u16,
    /// Reported before the first sample is taken.
    pub resting_bpm: u16,
}

impl Default for HeartRateParams {
    fn default() -> Self {
        Self {
            base_bpm: 120.0,
            reference_pace: 5.0,
            pace_gain: 10.0,
            fatigue_gain: 25.0,
            noise_sd: 3.0,
            wave_amplitude: 3.0,
            wave_divisor_ms: 6000.0,
            min_bpm: 95,
            max_bpm: 190,
            resting_bpm: 120,
        }
    }
}

/// Parameters of the mean-reverting pace process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerParams {
    /// Fraction of the gap to the objective pace closed per sample.
    pub reversion_rate: f64,
    /// Standard deviation of the pace noise (min/km).
    pub pace_noise_sd: f64,
    /// Physiological floor (min/km); the real pace never drops below it.
    pub min_pace: f64,
    pub heart_rate: HeartRateParams,
}

fn finite(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if finite(field, value)? < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if finite(field, value)? <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

impl HeartRateParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("base_bpm", self.base_bpm)?;
        finite("reference_pace", self.reference_pace)?;
        finite("pace_gain", self.pace_gain)?;
        finite("fatigue_gain", self.fatigue_gain)?;
        non_negative("noise_sd", self.noise_sd)?;
        finite("wave_amplitude", self.wave_amplitude)?;
        positive("wave_divisor_ms", self.wave_divisor_ms)?;
        if self.min_bpm > self.max_bpm {
            return Err(ConfigError::InvertedHeartRateBand {
                min: self.min_bpm,
                max: self.max_bpm,
            });
        }
        Ok(())
    }
}

impl SamplerParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = finite("reversion_rate", self.reversion_rate)?;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::ReversionOutOfRange(rate));
        }
        non_negative("pace_noise_sd", self.pace_noise_sd)?;
        positive("min_pace", self.min_pace)?;
        self.heart_rate.validate()
    }
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            reversion_rate: 0.25,
            pace_noise_sd: 0.05,
            min_pace: 3.0,
            heart_rate: HeartRateParams::default(),
        }
    }
}

/// Configuration of one simulated race.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Period of the animation tick.
    pub animation_period_ms: u64,
    /// Period of the sample/dispatch tick.
    pub sample_period_ms: u64,
    /// Maximum length of each history series.
    pub history_capacity: usize,
    /// Section length inside a kilometre split, in meters.
    pub split_section_m: u32,
    pub sampler: SamplerParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            animation_period_ms: 200,
            sample_period_ms: 5000,
            history_capacity: 300,
            split_section_m: 100,
            sampler: SamplerParams::default(),
        }
    }
}

impl SimulationConfig {
    /// Loads a JSON config file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the race loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampler.validate()
    }

    pub fn animation_period(&self) -> Duration {
        Duration::from_millis(self.animation_period_ms.max(1))
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms.max(1))
    }
}

/// Where the coaching service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
        }
    }
}
