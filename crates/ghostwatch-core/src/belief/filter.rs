//! Predict/correct recursion over per-ghost belief grids.

use super::distribution::BeliefGrid;
use super::sensor::{NoiseModel, SensorConfig, build_sensor_surface};
use super::transition::{BehaviorMode, TransitionSurface, build_transition_surface};
use crate::error::FilterError;
use crate::model::grid::MazeGrid;
use crate::model::position::{Position, manhattan};
use crate::model::state::PursuitState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

/// Filter parameters fixed for an episode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub behavior: BehaviorMode,
}

#[derive(Debug, Clone)]
pub struct BeliefFilter {
    noise: NoiseModel,
    behavior: BehaviorMode,
}

impl BeliefFilter {
    pub fn new(config: &FilterConfig) -> Result<Self, FilterError> {
        Ok(Self::with_noise(
            NoiseModel::from_config(&config.sensor)?,
            config.behavior,
        ))
    }

    pub fn with_noise(noise: NoiseModel, behavior: BehaviorMode) -> Self {
        Self { noise, behavior }
    }

    pub fn noise(&self) -> &NoiseModel {
        &self.noise
    }

    pub fn behavior(&self) -> BehaviorMode {
        self.behavior
    }

    /// One filtering step for every tracked ghost.
    ///
    /// Each ghost is updated independently from the same prior snapshot and the result
    /// is a fresh collection in input order. Removed ghosts come back all-zero; a ghost
    /// whose corrected belief has no mass also comes back all-zero rather than failing.
    pub fn update<G: MazeGrid + ?Sized>(
        &self,
        grid: &G,
        priors: &[BeliefGrid],
        evidences: &[f64],
        observer: Position,
        removed: &[bool],
    ) -> Result<Vec<BeliefGrid>, FilterError> {
        check_len("evidences", priors.len(), evidences.len())?;
        check_len("removed flags", priors.len(), removed.len())?;
        if let Some((ghost, value)) = evidences
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(FilterError::InvalidEvidence {
                ghost,
                value: *value,
            });
        }
        if !grid.contains(observer) {
            return Err(FilterError::OutOfBounds {
                position: observer,
                width: grid.width(),
                height: grid.height(),
            });
        }
        for prior in priors {
            prior.ensure_shape(grid)?;
        }

        let transition = build_transition_surface(grid, observer, self.behavior);
        let mut updated = Vec::with_capacity(priors.len());

        for (ghost, prior) in priors.iter().enumerate() {
            if removed[ghost] {
                updated.push(BeliefGrid::zeros(grid.width(), grid.height()));
                continue;
            }

            let mut belief = predict(prior, &transition);
            let sensor = build_sensor_surface(grid, observer, evidences[ghost], &self.noise);
            for (mass, likelihood) in belief.cells_mut().iter_mut().zip(sensor.values()) {
                *mass *= likelihood;
            }

            if !belief.normalize() && tracing::enabled!(Level::DEBUG) {
                event!(
                    target: "ghostwatch_core::filter",
                    Level::DEBUG,
                    ghost,
                    evidence = evidences[ghost],
                    observer = %observer,
                    "belief collapsed to zero mass"
                );
            }
            updated.push(belief);
        }

        Ok(updated)
    }
}

/// Forward projection of `prior` through `transition`.
///
/// `predicted[to] = sum over from of prior[from] * T[to][from]`. Only the four
/// neighbour entries of a source can be non-zero, so the sum visits those alone.
pub fn predict(prior: &BeliefGrid, transition: &TransitionSurface) -> BeliefGrid {
    let mut predicted = BeliefGrid::zeros(prior.width(), prior.height());
    for (from, mass) in prior.iter() {
        if mass == 0.0 {
            continue;
        }
        for (to, probability) in transition.outgoing(from) {
            if probability == 0.0 {
                continue;
            }
            if let Some(index) = predicted.index(to) {
                predicted.cells_mut()[index] += mass * probability;
            }
        }
    }
    predicted
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), FilterError> {
    if expected != actual {
        return Err(FilterError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Owns the current beliefs between ticks and drives one filter step per tick.
#[derive(Debug, Clone)]
pub struct BeliefTracker {
    filter: BeliefFilter,
    beliefs: Option<Vec<BeliefGrid>>,
}

impl BeliefTracker {
    pub fn new(filter: BeliefFilter) -> Self {
        Self {
            filter,
            beliefs: None,
        }
    }

    pub fn filter(&self) -> &BeliefFilter {
        &self.filter
    }

    /// Beliefs installed by the last tick, if any.
    pub fn beliefs(&self) -> Option<&[BeliefGrid]> {
        self.beliefs.as_deref()
    }

    /// Noisy distance from pacman to every ghost, removed ones included.
    pub fn observe<S, R>(&self, state: &S, rng: &mut R) -> Vec<f64>
    where
        S: PursuitState,
        R: Rng + ?Sized,
    {
        let pacman = state.pacman_position();
        state
            .ghost_positions()
            .iter()
            .map(|ghost| self.filter.noise.observe(manhattan(pacman, *ghost), rng))
            .collect()
    }

    /// Samples evidence, updates every belief and installs the result.
    ///
    /// Beliefs are seeded from the state on the first call.
    pub fn tick<S, R>(
        &mut self,
        state: &S,
        rng: &mut R,
    ) -> Result<(Vec<BeliefGrid>, Vec<f64>), FilterError>
    where
        S: PursuitState,
        R: Rng + ?Sized,
    {
        let evidences = self.observe(state, rng);
        let updated = {
            let priors = self.beliefs.get_or_insert_with(|| state.initial_beliefs());
            self.filter.update(
                state.grid(),
                priors,
                &evidences,
                state.pacman_position(),
                state.removed_flags(),
            )?
        };
        self.beliefs = Some(updated.clone());
        Ok((updated, evidences))
    }
}
