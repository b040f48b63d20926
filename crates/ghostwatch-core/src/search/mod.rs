//! Target selection over beliefs and the cost-biased pursuit planner.

mod planner;
mod target;

pub use planner::{HeuristicMode, PlanOutcome, plan, plan_with_stats};
pub use target::{Target, select_target};
