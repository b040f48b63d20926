mod idle;
mod pursuer;

pub use idle::IdlePursuer;
pub use pursuer::BeliefPursuer;

use ghostwatch_core::belief::BeliefGrid;
use ghostwatch_core::model::direction::Direction;
use ghostwatch_core::model::state::SearchState;

/// Identifies the run a decision belongs to, for structured logs.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryContext<'a> {
    pub run_id: &'a str,
    pub episode: usize,
    pub agent: &'a str,
}

/// Context provided to policies for decision-making
pub struct PursuitContext<'a, S> {
    pub state: &'a S,
    pub beliefs: &'a [BeliefGrid],
    pub tick: usize,
    pub telemetry: Option<TelemetryContext<'a>>,
}

impl<'a, S> PursuitContext<'a, S> {
    pub fn new(state: &'a S, beliefs: &'a [BeliefGrid], tick: usize) -> Self {
        Self {
            state,
            beliefs,
            tick,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryContext<'a>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

/// Picks pacman's move for one tick.
pub trait PursuitPolicy<S: SearchState>: Send {
    fn choose_move(&mut self, ctx: &PursuitContext<'_, S>) -> Direction;

    fn name(&self) -> &'static str;
}
