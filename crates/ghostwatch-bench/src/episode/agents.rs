use ghostwatch_bot::{BeliefPursuer, IdlePursuer, PlannerFeatures, PursuitPolicy};
use ghostwatch_core::model::state::GameState;

use crate::config::{AgentConfig, AgentKind};

/// Resolved agent definition; spawns a fresh policy per episode.
#[derive(Debug, Clone)]
pub struct AgentBlueprint {
    pub name: String,
    pub kind: AgentKind,
    pub features: PlannerFeatures,
}

impl AgentBlueprint {
    /// Config fields override the environment-derived `base` features.
    pub fn from_configs(configs: &[AgentConfig], base: PlannerFeatures) -> Vec<Self> {
        configs
            .iter()
            .map(|config| Self::from_config(config, base))
            .collect()
    }

    pub fn from_config(config: &AgentConfig, base: PlannerFeatures) -> Self {
        let features = match config.heuristic {
            Some(heuristic) => base.with_heuristic(heuristic),
            None => base,
        };
        Self {
            name: config.name.clone(),
            kind: config.kind,
            features,
        }
    }

    pub fn spawn_policy(&self) -> Box<dyn PursuitPolicy<GameState>> {
        match self.kind {
            AgentKind::Pursuer => Box::new(BeliefPursuer::new(self.features)),
            AgentKind::Idle => Box::new(IdlePursuer),
        }
    }
}
