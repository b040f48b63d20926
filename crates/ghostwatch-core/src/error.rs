//! Error types surfaced by the core crate.
//!
//! Model degeneracies (zero evidence mass, unreachable targets) are not errors; these
//! variants only describe caller bugs and malformed input.

use crate::model::direction::Direction;
use crate::model::position::Position;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("expected {expected} {what} but got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("position {position} lies outside the {width}x{height} maze")]
    OutOfBounds {
        position: Position,
        width: usize,
        height: usize,
    },
    #[error("belief is {actual_width}x{actual_height} but the maze is {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
    #[error("evidence {value} for ghost {ghost} is not a finite distance")]
    InvalidEvidence { ghost: usize, value: f64 },
    #[error("invalid sensor noise: {message}")]
    InvalidNoise { message: String },
    #[error("unknown behavior mode '{0}'")]
    UnknownBehavior(String),
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout is empty")]
    Empty,
    #[error("row {row} has width {found} but expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown glyph '{glyph}' at {position}")]
    UnknownGlyph { glyph: char, position: Position },
    #[error("layout has no pacman start")]
    MissingPacman,
    #[error("layout has more than one pacman start (second at {0})")]
    DuplicatePacman(Position),
    #[error("failed to read layout {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("{what} at {position} is not on an open cell")]
    Blocked {
        what: &'static str,
        position: Position,
    },
    #[error("move {direction} from {position} runs into a wall")]
    IllegalMove {
        position: Position,
        direction: Direction,
    },
}
