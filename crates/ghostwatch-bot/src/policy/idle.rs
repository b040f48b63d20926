use super::{PursuitContext, PursuitPolicy};
use ghostwatch_core::model::direction::Direction;
use ghostwatch_core::model::state::SearchState;

/// Baseline that never moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePursuer;

impl<S: SearchState> PursuitPolicy<S> for IdlePursuer {
    fn choose_move(&mut self, _ctx: &PursuitContext<'_, S>) -> Direction {
        Direction::Stop
    }

    fn name(&self) -> &'static str {
        "idle"
    }
}
