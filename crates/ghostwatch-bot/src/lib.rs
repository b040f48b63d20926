pub mod features;
pub mod policy;

pub use features::PlannerFeatures;
pub use policy::{
    BeliefPursuer, IdlePursuer, PursuitContext, PursuitPolicy, TelemetryContext,
};
