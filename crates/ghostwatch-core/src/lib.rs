//! Belief tracking and pursuit planning for a pacman-style hunt.
//!
//! - [`belief`]: per-ghost position beliefs, the noisy distance sensor and the
//!   behavior-biased movement model.
//! - [`search`]: target selection over beliefs and the best-first planner.
//! - [`model`]: maze geometry, layouts and the reference game state.

pub mod belief;
pub mod error;
pub mod model;
pub mod search;

pub use error::{FilterError, LayoutError, StateError};
