//! Behavior-biased ghost movement model.

use crate::error::FilterError;
use crate::model::grid::MazeGrid;
use crate::model::position::{Position, manhattan};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Neighbour visiting order shared by the transition model and ghost simulation.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// How strongly a tracked ghost prefers moves that increase its distance to pacman.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorMode {
    /// Indifferent to distance.
    #[default]
    #[serde(alias = "confused")]
    Cautious,
    /// Moderately distance-averse.
    #[serde(alias = "afraid")]
    Wary,
    /// Flees aggressively.
    #[serde(alias = "scared")]
    Erratic,
}

impl BehaviorMode {
    pub const ALL: [BehaviorMode; 3] = [
        BehaviorMode::Cautious,
        BehaviorMode::Wary,
        BehaviorMode::Erratic,
    ];

    /// Weight given to a neighbour that moves away from the observer.
    pub const fn away_weight(self) -> f64 {
        match self {
            BehaviorMode::Cautious => 1.0,
            BehaviorMode::Wary => 2.0,
            BehaviorMode::Erratic => 8.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            BehaviorMode::Cautious => "cautious",
            BehaviorMode::Wary => "wary",
            BehaviorMode::Erratic => "erratic",
        }
    }

    /// Reads `GW_BEHAVIOR`; unknown or missing values fall back to the default mode.
    pub fn from_env() -> Self {
        Self::from_reader(|key| env::var(key).ok())
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        read("GW_BEHAVIOR")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for BehaviorMode {
    type Err = FilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cautious" | "confused" => Ok(BehaviorMode::Cautious),
            "wary" | "afraid" => Ok(BehaviorMode::Wary),
            "erratic" | "scared" => Ok(BehaviorMode::Erratic),
            other => Err(FilterError::UnknownBehavior(other.to_string())),
        }
    }
}

/// Unnormalized move weights out of `cell`, in [`NEIGHBOR_OFFSETS`] order.
///
/// Walls and cells outside the maze get weight 0, neighbours farther from `observer`
/// get the mode's away weight and every other neighbour gets 1.
pub fn step_weights<G: MazeGrid + ?Sized>(
    grid: &G,
    observer: Position,
    cell: Position,
    mode: BehaviorMode,
) -> [(Option<Position>, f64); 4] {
    let distance = manhattan(observer, cell);
    NEIGHBOR_OFFSETS.map(|(dx, dy)| {
        let Some(next) = cell.offset(dx, dy).filter(|next| grid.contains(*next)) else {
            return (None, 0.0);
        };
        let weight = if grid.is_wall(next.x, next.y) {
            0.0
        } else if manhattan(observer, next) > distance {
            mode.away_weight()
        } else {
            1.0
        };
        (Some(next), weight)
    })
}

/// `P(next = to | current = from)` for every pair of cells.
///
/// Only non-wall interior cells are valid sources; the border ring and walls keep an
/// all-zero outgoing row.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSurface {
    width: usize,
    height: usize,
    entries: Vec<f64>,
}

impl TransitionSurface {
    fn zeros(width: usize, height: usize) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            entries: vec![0.0; cells * cells],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Entry `(to.x, to.y, from.x, from.y)` of the 4-D surface.
    pub fn probability(&self, to: Position, from: Position) -> f64 {
        match (self.cell_index(to), self.cell_index(from)) {
            (Some(to), Some(from)) => self.entries[self.entry_index(to, from)],
            _ => 0.0,
        }
    }

    /// The four neighbour entries out of `from` (zero-weight ones included).
    pub fn outgoing(&self, from: Position) -> impl Iterator<Item = (Position, f64)> + '_ {
        NEIGHBOR_OFFSETS.into_iter().filter_map(move |(dx, dy)| {
            let to = from.offset(dx, dy)?;
            self.cell_index(to)?;
            Some((to, self.probability(to, from)))
        })
    }

    pub fn outgoing_mass(&self, from: Position) -> f64 {
        self.outgoing(from).map(|(_, probability)| probability).sum()
    }

    fn set(&mut self, to: Position, from: Position, value: f64) {
        if let (Some(to), Some(from)) = (self.cell_index(to), self.cell_index(from)) {
            let index = self.entry_index(to, from);
            self.entries[index] = value;
        }
    }

    fn cell_index(&self, position: Position) -> Option<usize> {
        if position.x >= self.width || position.y >= self.height {
            return None;
        }
        Some(position.x * self.height + position.y)
    }

    fn entry_index(&self, to: usize, from: usize) -> usize {
        to * self.width * self.height + from
    }
}

pub fn build_transition_surface<G: MazeGrid + ?Sized>(
    grid: &G,
    observer: Position,
    mode: BehaviorMode,
) -> TransitionSurface {
    let width = grid.width();
    let height = grid.height();
    let mut surface = TransitionSurface::zeros(width, height);
    if width < 3 || height < 3 {
        return surface;
    }

    for i in 1..width - 1 {
        for j in 1..height - 1 {
            if grid.is_wall(i, j) {
                continue;
            }
            let from = Position::new(i, j);
            let weights = step_weights(grid, observer, from, mode);
            let norm: f64 = weights.iter().map(|(_, weight)| weight).sum();
            if norm == 0.0 {
                continue;
            }
            for (to, weight) in weights {
                if let Some(to) = to {
                    surface.set(to, from, weight / norm);
                }
            }
        }
    }

    surface
}
