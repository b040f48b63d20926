use ghostwatch_bot::{
    BeliefPursuer, IdlePursuer, PlannerFeatures, PursuitContext, PursuitPolicy, TelemetryContext,
};
use ghostwatch_core::belief::{BehaviorMode, BeliefGrid};
use ghostwatch_core::model::direction::Direction;
use ghostwatch_core::model::layout::Layout;
use ghostwatch_core::model::position::Position;
use ghostwatch_core::model::state::GameState;
use ghostwatch_core::search::HeuristicMode;

const HALL: &str = "\
%%%%%%%
%P   G%
%%% %%%
% %G  %
%%%%%%%
";

fn hall_state() -> GameState {
    let layout = Layout::parse(HALL).expect("layout");
    GameState::from_layout(&layout, BehaviorMode::Cautious).expect("state")
}

fn point(position: Position) -> BeliefGrid {
    BeliefGrid::point(7, 5, position).expect("point belief")
}

#[test]
fn pursuer_heads_toward_first_active_ghost() {
    let state = hall_state();
    // Second ghost is removed; the first one is believed to sit at the hall's east end.
    let beliefs = vec![point(Position::new(5, 3)), BeliefGrid::zeros(7, 5)];
    let ctx = PursuitContext::new(&state, &beliefs, 0);

    let mut policy = BeliefPursuer::default();
    assert_eq!(policy.choose_move(&ctx), Direction::East);
}

#[test]
fn pursuer_holds_when_every_belief_is_empty() {
    let state = hall_state();
    let beliefs = vec![BeliefGrid::zeros(7, 5), BeliefGrid::zeros(7, 5)];
    let ctx = PursuitContext::new(&state, &beliefs, 3);

    let mut policy = BeliefPursuer::new(PlannerFeatures::new(HeuristicMode::BeliefWeighted));
    assert_eq!(policy.choose_move(&ctx), Direction::Stop);
}

#[test]
fn pursuer_holds_when_target_is_under_pacman_or_walled_off() {
    let state = hall_state();

    let on_target = vec![point(Position::new(1, 3))];
    let ctx = PursuitContext::new(&state, &on_target, 1);
    let mut policy = BeliefPursuer::default();
    assert_eq!(policy.choose_move(&ctx), Direction::Stop);

    // (1, 1) is open but walled in on every side.
    let sealed = vec![point(Position::new(1, 1))];
    let ctx = PursuitContext::new(&state, &sealed, 2);
    assert_eq!(policy.choose_move(&ctx), Direction::Stop);
}

#[test]
fn pursuer_reaches_lower_corridor_through_the_gap() {
    let state = hall_state();
    let beliefs = vec![point(Position::new(4, 1))];
    let telemetry = TelemetryContext {
        run_id: "test",
        episode: 0,
        agent: "pursuer",
    };
    let ctx = PursuitContext::new(&state, &beliefs, 0).with_telemetry(telemetry);

    let mut policy = BeliefPursuer::new(
        PlannerFeatures::default().with_decision_logging(true),
    );
    // Only route down is the gap at x = 3.
    assert_eq!(policy.choose_move(&ctx), Direction::East);
}

#[test]
fn idle_pursuer_never_moves() {
    let state = hall_state();
    let beliefs = vec![point(Position::new(5, 3))];
    let ctx = PursuitContext::new(&state, &beliefs, 0);

    let mut policy = IdlePursuer;
    assert_eq!(policy.choose_move(&ctx), Direction::Stop);
    assert_eq!(PursuitPolicy::<GameState>::name(&policy), "idle");
}
