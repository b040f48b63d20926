use crate::belief::BeliefGrid;
use crate::model::position::Position;

/// Most probable cell of the ghost the pursuer commits to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub ghost: usize,
    pub position: Position,
    pub mass: f64,
}

/// Picks the arg-max cell of the first ghost whose belief carries any mass.
///
/// Ghosts with an all-zero belief (removed, or no information) are skipped. Returns
/// `None` when every belief is zero; callers hold position in that case.
pub fn select_target(beliefs: &[BeliefGrid]) -> Option<Target> {
    beliefs.iter().enumerate().find_map(|(ghost, belief)| {
        belief.argmax().map(|(position, mass)| Target {
            ghost,
            position,
            mass,
        })
    })
}
