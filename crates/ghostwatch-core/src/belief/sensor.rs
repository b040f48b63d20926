//! Binomial distance-sensor model.

use crate::error::FilterError;
use crate::model::grid::MazeGrid;
use crate::model::position::{Position, manhattan};
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, Discrete};
use std::env;

pub const DEFAULT_SENSOR_VARIANCE: f64 = 1.0;
pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.5;

const INTEGRAL_TOLERANCE: f64 = 1e-9;
/// Largest accepted noise variance; sampling cost grows with the trial count.
pub const MAX_SENSOR_VARIANCE: f64 = 64.0;

/// Configured sensor noise. The binomial trial count is derived from it once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub variance: f64,
    #[serde(default = "default_success_probability")]
    pub success_probability: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            variance: DEFAULT_SENSOR_VARIANCE,
            success_probability: DEFAULT_SUCCESS_PROBABILITY,
        }
    }
}

impl SensorConfig {
    pub fn with_variance(variance: f64) -> Self {
        Self {
            variance,
            ..Self::default()
        }
    }

    /// Reads `GW_SENSOR_VARIANCE`, clamped to `[0, MAX_SENSOR_VARIANCE]`.
    pub fn from_env() -> Self {
        Self::from_reader(|key| env::var(key).ok())
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let variance = read("GW_SENSOR_VARIANCE")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(DEFAULT_SENSOR_VARIANCE)
            .clamp(0.0, MAX_SENSOR_VARIANCE);
        Self::with_variance(variance)
    }
}

fn default_success_probability() -> f64 {
    DEFAULT_SUCCESS_PROBABILITY
}

/// Additive binomial noise on the true Manhattan distance, re-centred to zero mean.
#[derive(Debug, Clone)]
pub struct NoiseModel {
    trials: u64,
    success_probability: f64,
    binomial: Binomial,
}

impl NoiseModel {
    pub fn new(trials: u64, success_probability: f64) -> Result<Self, FilterError> {
        if !(success_probability > 0.0 && success_probability < 1.0) {
            return Err(FilterError::InvalidNoise {
                message: format!("success probability {success_probability} must lie in (0, 1)"),
            });
        }
        let binomial =
            Binomial::new(success_probability, trials).map_err(|err| FilterError::InvalidNoise {
                message: err.to_string(),
            })?;
        Ok(Self {
            trials,
            success_probability,
            binomial,
        })
    }

    /// `n = floor(variance / (p (1 - p)))`.
    pub fn from_config(config: &SensorConfig) -> Result<Self, FilterError> {
        let p = config.success_probability;
        if !config.variance.is_finite() || config.variance < 0.0 {
            return Err(FilterError::InvalidNoise {
                message: format!("variance {} must be finite and non-negative", config.variance),
            });
        }
        if !(p > 0.0 && p < 1.0) {
            return Err(FilterError::InvalidNoise {
                message: format!("success probability {p} must lie in (0, 1)"),
            });
        }
        let trials = (config.variance / (p * (1.0 - p))).floor() as u64;
        Self::new(trials, p)
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    /// Offset `n p` that re-centres the binomial draw.
    pub fn mean(&self) -> f64 {
        self.trials as f64 * self.success_probability
    }

    pub fn variance(&self) -> f64 {
        self.mean() * (1.0 - self.success_probability)
    }

    /// `P(evidence | true distance)`. Zero when the implied binomial count is negative,
    /// above `n`, or not integral.
    pub fn likelihood(&self, true_distance: usize, evidence: f64) -> f64 {
        let k = true_distance as f64 - evidence + self.mean();
        let rounded = k.round();
        if (k - rounded).abs() > INTEGRAL_TOLERANCE || rounded < 0.0 {
            return 0.0;
        }
        if rounded > self.trials as f64 {
            return 0.0;
        }
        self.binomial.pmf(rounded as u64)
    }

    /// Draws a zero-mean noise term.
    pub fn sample_noise<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let draw: f64 = rand::distributions::Distribution::sample(&self.binomial, rng);
        draw - self.mean()
    }

    /// Noisy reading of `true_distance`.
    pub fn observe<R: Rng + ?Sized>(&self, true_distance: usize, rng: &mut R) -> f64 {
        true_distance as f64 + self.sample_noise(rng)
    }
}

/// Likelihood of one evidence value at every cell. Not normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSurface {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl SensorSurface {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn likelihood(&self, position: Position) -> f64 {
        if position.x >= self.width || position.y >= self.height {
            return 0.0;
        }
        self.values[position.x * self.height + position.y]
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Evaluates the noise model for every cell against `evidence` observed from `observer`.
///
/// Walls are not masked here; the transition-projected belief already carries no mass
/// on them.
pub fn build_sensor_surface<G: MazeGrid + ?Sized>(
    grid: &G,
    observer: Position,
    evidence: f64,
    noise: &NoiseModel,
) -> SensorSurface {
    let width = grid.width();
    let height = grid.height();
    let mut values = Vec::with_capacity(width * height);
    for x in 0..width {
        for y in 0..height {
            let distance = manhattan(observer, Position::new(x, y));
            values.push(noise.likelihood(distance, evidence));
        }
    }
    SensorSurface {
        width,
        height,
        values,
    }
}
