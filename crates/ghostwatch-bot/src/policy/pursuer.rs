use super::{PursuitContext, PursuitPolicy};
use crate::features::PlannerFeatures;
use ghostwatch_core::model::direction::Direction;
use ghostwatch_core::model::state::SearchState;
use ghostwatch_core::search::{PlanOutcome, Target, plan_with_stats, select_target};
use tracing::{Level, event};

/// Chases the most probable cell of the first tracked ghost.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeliefPursuer {
    features: PlannerFeatures,
}

impl BeliefPursuer {
    pub fn new(features: PlannerFeatures) -> Self {
        Self { features }
    }
}

impl<S: SearchState> PursuitPolicy<S> for BeliefPursuer {
    fn choose_move(&mut self, ctx: &PursuitContext<'_, S>) -> Direction {
        let Some(target) = select_target(ctx.beliefs) else {
            log_decision(ctx, self.features, None, None, Direction::Stop, "no_active_target");
            return Direction::Stop;
        };

        let outcome = plan_with_stats(
            ctx.state,
            target.position,
            ctx.beliefs,
            target.ghost,
            self.features.heuristic(),
        );
        let (direction, reason) = match outcome.moves.first() {
            Some(first) => (*first, "planned"),
            None if ctx.state.pacman_position() == target.position => (Direction::Stop, "on_target"),
            None => (Direction::Stop, "unreachable"),
        };
        log_decision(ctx, self.features, Some(&target), Some(&outcome), direction, reason);
        direction
    }

    fn name(&self) -> &'static str {
        "pursuer"
    }
}

fn log_decision<S: SearchState>(
    ctx: &PursuitContext<'_, S>,
    features: PlannerFeatures,
    target: Option<&Target>,
    outcome: Option<&PlanOutcome>,
    direction: Direction,
    reason: &str,
) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    let (run_id, episode, agent) = ctx
        .telemetry
        .map(|telemetry| (telemetry.run_id, telemetry.episode, telemetry.agent))
        .unwrap_or(("-", 0, "-"));

    if !features.decision_logging() {
        event!(
            target: "ghostwatch_bot::decision",
            Level::DEBUG,
            run_id,
            episode,
            agent,
            tick = ctx.tick,
            direction = direction.label(),
            reason
        );
        return;
    }

    event!(
        target: "ghostwatch_bot::decision",
        Level::DEBUG,
        run_id,
        episode,
        agent,
        tick = ctx.tick,
        pacman = %ctx.state.pacman_position(),
        ghost = target.map(|t| t.ghost),
        target = ?target.map(|t| t.position),
        mass = target.map(|t| t.mass),
        heuristic = ?features.heuristic(),
        plan_len = outcome.map(|o| o.moves.len()),
        expanded = outcome.map(|o| o.expanded),
        generated = outcome.map(|o| o.generated),
        direction = direction.label(),
        reason
    );
}
