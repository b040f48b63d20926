//! Game-state boundary consumed by the planner and the belief tracker, plus the
//! reference state used by the episode harness.

use crate::belief::{BehaviorMode, BeliefGrid, step_weights};
use crate::error::StateError;
use crate::model::direction::Direction;
use crate::model::grid::{Grid, MazeGrid};
use crate::model::layout::Layout;
use crate::model::position::Position;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use std::sync::Arc;

/// Minimal view the planner searches over.
pub trait SearchState: Sized {
    fn pacman_position(&self) -> Position;

    /// Successor states reachable in one pacman move, paired with that move.
    fn generate_pacman_successors(&self) -> Vec<(Self, Direction)>;
}

/// Full view the belief tracker needs each tick.
pub trait PursuitState: SearchState {
    type Grid: MazeGrid;

    fn grid(&self) -> &Self::Grid;

    fn ghost_positions(&self) -> &[Position];

    fn removed_flags(&self) -> &[bool];

    /// Belief seeding used before the first update.
    fn initial_beliefs(&self) -> Vec<BeliefGrid> {
        let prior = BeliefGrid::uniform(self.grid());
        vec![prior; self.ghost_positions().len()]
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    grid: Arc<Grid>,
    behavior: BehaviorMode,
    pacman: Position,
    ghosts: Vec<Position>,
    removed: Vec<bool>,
}

impl GameState {
    pub fn new(
        grid: Arc<Grid>,
        pacman: Position,
        ghosts: Vec<Position>,
        behavior: BehaviorMode,
    ) -> Result<Self, StateError> {
        if !grid.is_open(pacman) {
            return Err(StateError::Blocked {
                what: "pacman",
                position: pacman,
            });
        }
        if let Some(ghost) = ghosts.iter().find(|ghost| !grid.is_open(**ghost)) {
            return Err(StateError::Blocked {
                what: "ghost",
                position: *ghost,
            });
        }

        let removed = vec![false; ghosts.len()];
        let mut state = Self {
            grid,
            behavior,
            pacman,
            ghosts,
            removed,
        };
        state.resolve_captures();
        Ok(state)
    }

    pub fn from_layout(layout: &Layout, behavior: BehaviorMode) -> Result<Self, StateError> {
        Self::new(
            Arc::new(layout.grid().clone()),
            layout.pacman(),
            layout.ghosts().to_vec(),
            behavior,
        )
    }

    pub fn behavior(&self) -> BehaviorMode {
        self.behavior
    }

    pub fn legal_pacman_moves(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|direction| self.target_of(*direction).is_some())
            .collect()
    }

    /// Moves pacman; ghosts sharing the destination cell are removed from play.
    pub fn apply_pacman_move(&self, direction: Direction) -> Result<Self, StateError> {
        let Some(next) = self.target_of(direction) else {
            return Err(StateError::IllegalMove {
                position: self.pacman,
                direction,
            });
        };
        let mut successor = self.clone();
        successor.pacman = next;
        successor.resolve_captures();
        Ok(successor)
    }

    /// Moves every active ghost one step, biased away from pacman according to the
    /// behavior mode. A ghost with no open neighbour stays put.
    pub fn advance_ghosts<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for index in 0..self.ghosts.len() {
            if self.removed[index] {
                continue;
            }
            let weights = step_weights(
                self.grid.as_ref(),
                self.pacman,
                self.ghosts[index],
                self.behavior,
            );
            let Ok(sampler) = WeightedIndex::new(weights.iter().map(|(_, weight)| *weight)) else {
                continue;
            };
            if let Some(next) = weights[sampler.sample(rng)].0 {
                self.ghosts[index] = next;
            }
        }
        self.resolve_captures();
    }

    pub fn active_ghosts(&self) -> usize {
        self.removed.iter().filter(|removed| !**removed).count()
    }

    pub fn is_cleared(&self) -> bool {
        self.active_ghosts() == 0
    }

    fn target_of(&self, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.delta();
        self.pacman
            .offset(dx, dy)
            .filter(|next| self.grid.is_open(*next))
    }

    fn resolve_captures(&mut self) {
        for (ghost, removed) in self.ghosts.iter().zip(self.removed.iter_mut()) {
            if *ghost == self.pacman {
                *removed = true;
            }
        }
    }
}

impl SearchState for GameState {
    fn pacman_position(&self) -> Position {
        self.pacman
    }

    fn generate_pacman_successors(&self) -> Vec<(Self, Direction)> {
        self.legal_pacman_moves()
            .into_iter()
            .filter_map(|direction| {
                self.apply_pacman_move(direction)
                    .ok()
                    .map(|state| (state, direction))
            })
            .collect()
    }
}

impl PursuitState for GameState {
    type Grid = Grid;

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn ghost_positions(&self) -> &[Position] {
        &self.ghosts
    }

    fn removed_flags(&self) -> &[bool] {
        &self.removed
    }
}
