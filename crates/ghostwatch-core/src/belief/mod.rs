//! Discrete Bayesian tracking of hidden ghost positions.
//!
//! This module is composed of:
//! - `distribution`: the per-ghost probability grid (`BeliefGrid`).
//! - `sensor`: binomial noise model and the likelihood surface it induces.
//! - `transition`: behavior-biased movement model between adjacent open cells.
//! - `filter`: the predict/correct recursion and the tick-level tracker.
//! - `metrics`: quality measurements of a belief against the true positions.

mod distribution;
mod filter;
pub mod metrics;
mod sensor;
mod transition;

pub use distribution::BeliefGrid;
pub use filter::{BeliefFilter, BeliefTracker, FilterConfig, predict};
pub use sensor::{
    MAX_SENSOR_VARIANCE, NoiseModel, SensorConfig, SensorSurface, build_sensor_surface,
};
pub use transition::{
    BehaviorMode, NEIGHBOR_OFFSETS, TransitionSurface, build_transition_surface, step_weights,
};
