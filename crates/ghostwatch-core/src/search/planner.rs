//! Best-first pursuit planner.
//!
//! The closed set is keyed by `(pacman position, target ghost)` rather than by the full
//! game state: states that only differ in ghost positions or removal flags collapse into
//! one search node. This keeps the frontier bounded by the number of open cells.

use crate::belief::BeliefGrid;
use crate::model::direction::Direction;
use crate::model::position::{Position, manhattan};
use crate::model::state::SearchState;
use core::cmp::Ordering;
use serde::{Deserialize, Serialize};
use std::collections::{BinaryHeap, HashSet};

/// Discount applied to the heuristic at full belief mass.
const BELIEF_DISCOUNT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicMode {
    /// Plain Manhattan distance to the target.
    #[default]
    Manhattan,
    /// Manhattan distance scaled by `1 - 0.5 * mass`, where `mass` is the belief at the
    /// target cell.
    BeliefWeighted,
}

impl HeuristicMode {
    pub fn estimate(self, from: Position, target: Position, mass: f64) -> f64 {
        let distance = manhattan(from, target) as f64;
        match self {
            HeuristicMode::Manhattan => distance,
            HeuristicMode::BeliefWeighted => distance * (1.0 - BELIEF_DISCOUNT * mass),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanOutcome {
    pub moves: Vec<Direction>,
    /// Nodes popped from the frontier and expanded.
    pub expanded: usize,
    /// Successors pushed onto the frontier.
    pub generated: usize,
}

impl PlanOutcome {
    pub fn reached(&self) -> bool {
        !self.moves.is_empty()
    }
}

struct FrontierNode<S> {
    priority: f64,
    order: u64,
    cost: u32,
    moves: Vec<Direction>,
    state: S,
}

impl<S> PartialEq for FrontierNode<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S> Eq for FrontierNode<S> {}

impl<S> PartialOrd for FrontierNode<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for FrontierNode<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the lowest priority first, oldest entry on ties.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Shortest move sequence from `initial` to `target`; empty when already there or
/// unreachable.
pub fn plan<S: SearchState>(
    initial: &S,
    target: Position,
    beliefs: &[BeliefGrid],
    ghost: usize,
    heuristic: HeuristicMode,
) -> Vec<Direction> {
    plan_with_stats(initial, target, beliefs, ghost, heuristic).moves
}

pub fn plan_with_stats<S: SearchState>(
    initial: &S,
    target: Position,
    beliefs: &[BeliefGrid],
    ghost: usize,
    heuristic: HeuristicMode,
) -> PlanOutcome {
    if initial.pacman_position() == target {
        return PlanOutcome::default();
    }

    let mass = beliefs
        .get(ghost)
        .map(|belief| belief.probability(target))
        .unwrap_or(0.0);
    let mut search = Search {
        target,
        ghost,
        mass,
        heuristic,
        closed: HashSet::new(),
        frontier: BinaryHeap::new(),
        order: 0,
        outcome: PlanOutcome::default(),
    };

    search.close(initial);
    if let Some(moves) = search.expand(initial, 0, &[]) {
        return search.finish(moves);
    }

    while let Some(node) = search.frontier.pop() {
        if !search.close(&node.state) {
            continue;
        }
        if let Some(moves) = search.expand(&node.state, node.cost, &node.moves) {
            return search.finish(moves);
        }
    }

    search.outcome
}

struct Search<S> {
    target: Position,
    ghost: usize,
    mass: f64,
    heuristic: HeuristicMode,
    closed: HashSet<(Position, usize)>,
    frontier: BinaryHeap<FrontierNode<S>>,
    order: u64,
    outcome: PlanOutcome,
}

impl<S: SearchState> Search<S> {
    /// Marks the state's key as closed; `false` if it already was.
    fn close(&mut self, state: &S) -> bool {
        self.closed.insert((state.pacman_position(), self.ghost))
    }

    /// Pushes the unvisited successors of `state`. Returns the full move sequence as soon
    /// as one of them stands on the target.
    fn expand(&mut self, state: &S, cost: u32, moves: &[Direction]) -> Option<Vec<Direction>> {
        self.outcome.expanded += 1;
        for (next, direction) in state.generate_pacman_successors() {
            let position = next.pacman_position();
            if self.closed.contains(&(position, self.ghost)) {
                continue;
            }

            let mut path = moves.to_vec();
            path.push(direction);
            self.outcome.generated += 1;
            if position == self.target {
                return Some(path);
            }

            let cost = cost + 1;
            self.order += 1;
            self.frontier.push(FrontierNode {
                priority: f64::from(cost)
                    + self.heuristic.estimate(position, self.target, self.mass),
                order: self.order,
                cost,
                moves: path,
                state: next,
            });
        }
        None
    }

    fn finish(mut self, moves: Vec<Direction>) -> PlanOutcome {
        self.outcome.moves = moves;
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::BehaviorMode;
    use crate::model::grid::Grid;
    use crate::model::layout::Layout;
    use crate::model::state::GameState;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn state_from(text: &str) -> GameState {
        let layout = Layout::parse(text).expect("layout");
        GameState::from_layout(&layout, BehaviorMode::Cautious).expect("state")
    }

    fn walk(state: &GameState, moves: &[Direction]) -> Position {
        moves
            .iter()
            .fold(state.clone(), |current, direction| {
                current.apply_pacman_move(*direction).expect("legal move")
            })
            .pacman_position()
    }

    #[test]
    fn finds_shortest_path_around_a_wall() {
        let state = state_from(
            "\
%%%%%%%
%P %  %
%  %  %
%     %
%%%%%%%
",
        );
        let target = Position::new(4, 3);
        let moves = plan(&state, target, &[], 0, HeuristicMode::Manhattan);
        assert_eq!(moves.len(), 7);
        assert_eq!(walk(&state, &moves), target);
    }

    #[test]
    fn single_step_target_returns_that_step() {
        let state = state_from("%%%%\n%P %\n%%%%\n");
        let moves = plan(&state, Position::new(2, 1), &[], 0, HeuristicMode::Manhattan);
        assert_eq!(moves, vec![Direction::East]);
    }

    #[test]
    fn walled_off_target_yields_empty_plan() {
        let state = state_from(
            "\
%%%%%%%
%P %  %
%  % G%
%%%%%%%
",
        );
        let outcome = plan_with_stats(
            &state,
            Position::new(5, 1),
            &[],
            0,
            HeuristicMode::BeliefWeighted,
        );
        assert!(!outcome.reached());
        assert_eq!(outcome.expanded, 4);
    }

    struct CountingState {
        position: Position,
        calls: Rc<Cell<usize>>,
    }

    impl SearchState for CountingState {
        fn pacman_position(&self) -> Position {
            self.position
        }

        fn generate_pacman_successors(&self) -> Vec<(Self, Direction)> {
            self.calls.set(self.calls.get() + 1);
            Vec::new()
        }
    }

    #[test]
    fn standing_on_target_never_generates_successors() {
        let calls = Rc::new(Cell::new(0));
        let state = CountingState {
            position: Position::new(2, 2),
            calls: Rc::clone(&calls),
        };
        let outcome = plan_with_stats(
            &state,
            Position::new(2, 2),
            &[],
            0,
            HeuristicMode::Manhattan,
        );
        assert!(outcome.moves.is_empty());
        assert_eq!(outcome.expanded, 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn belief_weighted_heuristic_discounts_confident_targets() {
        let from = Position::new(0, 0);
        let target = Position::new(3, 1);
        assert_eq!(HeuristicMode::Manhattan.estimate(from, target, 1.0), 4.0);
        assert_eq!(HeuristicMode::BeliefWeighted.estimate(from, target, 0.0), 4.0);
        assert_eq!(HeuristicMode::BeliefWeighted.estimate(from, target, 1.0), 2.0);
        assert_eq!(HeuristicMode::BeliefWeighted.estimate(from, target, 0.5), 3.0);
    }

    #[test]
    fn both_heuristics_agree_on_path_length_in_open_rooms() {
        let grid = Arc::new(Grid::bordered(9, 9));
        let state = GameState::new(
            grid.clone(),
            Position::new(1, 1),
            vec![Position::new(7, 7)],
            BehaviorMode::Cautious,
        )
        .unwrap();
        let belief = BeliefGrid::uniform(grid.as_ref());
        let target = Position::new(6, 5);
        let plain = plan(&state, target, &[belief.clone()], 0, HeuristicMode::Manhattan);
        let weighted = plan(&state, target, &[belief], 0, HeuristicMode::BeliefWeighted);
        assert_eq!(plain.len(), 9);
        assert_eq!(weighted.len(), 9);
        assert_eq!(walk(&state, &weighted), target);
    }
}
