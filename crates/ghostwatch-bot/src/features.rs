use ghostwatch_core::search::HeuristicMode;

/// Planner switches read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlannerFeatures {
    heuristic: HeuristicMode,
    decision_logging: bool,
}

impl PlannerFeatures {
    pub const fn new(heuristic: HeuristicMode) -> Self {
        Self {
            heuristic,
            decision_logging: false,
        }
    }

    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub const fn heuristic(self) -> HeuristicMode {
        self.heuristic
    }

    pub const fn decision_logging(self) -> bool {
        self.decision_logging
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicMode) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_decision_logging(mut self, enabled: bool) -> Self {
        self.decision_logging = enabled;
        self
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let heuristic = if read("GW_BELIEF_HEURISTIC")
            .map(|raw| is_truthy(&raw))
            .unwrap_or(false)
        {
            HeuristicMode::BeliefWeighted
        } else {
            HeuristicMode::Manhattan
        };

        let decision_logging = read("GW_DECISION_DETAILS")
            .map(|raw| is_truthy(&raw))
            .unwrap_or(false);

        Self {
            heuristic,
            decision_logging,
        }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn features_from(pairs: &[(&str, &str)]) -> PlannerFeatures {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlannerFeatures::from_reader(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_plain_manhattan() {
        let features = features_from(&[]);
        assert_eq!(features.heuristic(), HeuristicMode::Manhattan);
        assert!(!features.decision_logging());
    }

    #[test]
    fn truthy_flag_enables_belief_heuristic() {
        let features = features_from(&[("GW_BELIEF_HEURISTIC", "on"), ("GW_DECISION_DETAILS", "1")]);
        assert_eq!(features.heuristic(), HeuristicMode::BeliefWeighted);
        assert!(features.decision_logging());

        let off = features_from(&[("GW_BELIEF_HEURISTIC", "nope")]);
        assert_eq!(off.heuristic(), HeuristicMode::Manhattan);
    }
}
