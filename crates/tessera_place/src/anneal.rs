//! Shared simulated annealing schedule.
//!
//! Both the coarse and the detailed placer accept moves with the Metropolis
//! criterion under a geometric cooling schedule with a fixed step budget.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tessera_config::AnnealConfig;

/// Lowest allowed starting temperature.
pub const MIN_INITIAL_TEMPERATURE: f64 = 1.0;

/// Number of trial moves sampled to pick the starting temperature.
pub const TEMPERATURE_SAMPLES: usize = 64;

/// Step budget and cooling parameters for one anneal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnealParams {
    /// Total moves proposed.
    pub steps: usize,
    /// Geometric cooling factor in (0, 1).
    pub cooling_rate: f64,
    /// Moves proposed at each temperature.
    pub moves_per_temperature: usize,
}

impl AnnealParams {
    /// Parameters for a coarse anneal.
    pub fn coarse(config: &AnnealConfig) -> Self {
        Self {
            steps: config.coarse_steps,
            cooling_rate: config.cooling_rate,
            moves_per_temperature: config.moves_per_temperature,
        }
    }

    /// Parameters for a detailed anneal over `members` blocks.
    ///
    /// The budget is `max(min_steps, steps_per_block * members) * multiplier`.
    pub fn detailed(config: &AnnealConfig, members: usize, multiplier: usize) -> Self {
        let base = config
            .min_steps
            .max(config.steps_per_block.saturating_mul(members));
        Self {
            steps: base.saturating_mul(multiplier),
            cooling_rate: config.cooling_rate,
            moves_per_temperature: config.moves_per_temperature,
        }
    }
}

/// Tracks the temperature across a fixed number of steps.
#[derive(Debug, Clone)]
pub struct Schedule {
    params: AnnealParams,
    temperature: f64,
    step: usize,
}

impl Schedule {
    /// Starts a schedule at `initial_temperature`.
    pub fn new(params: AnnealParams, initial_temperature: f64) -> Self {
        Self {
            params,
            temperature: initial_temperature.max(MIN_INITIAL_TEMPERATURE),
            step: 0,
        }
    }

    /// Returns the current temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Advances one step, cooling at each temperature boundary.
    ///
    /// Returns `false` once the step budget is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.step >= self.params.steps {
            return false;
        }
        self.step += 1;
        if self.step % self.params.moves_per_temperature.max(1) == 0 {
            self.temperature *= self.params.cooling_rate;
        }
        true
    }

    /// Decides whether to accept a move with cost change `delta`.
    pub fn accept(&self, delta: f64, rng: &mut impl Rng) -> bool {
        delta <= 0.0 || rng.gen::<f64>() < (-delta / self.temperature).exp()
    }
}

/// Starting temperature from sampled move deltas: their mean magnitude.
pub fn initial_temperature(deltas: &[f64]) -> f64 {
    if deltas.is_empty() {
        return MIN_INITIAL_TEMPERATURE;
    }
    let mean = deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64;
    mean.max(MIN_INITIAL_TEMPERATURE)
}
