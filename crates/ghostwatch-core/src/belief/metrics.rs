use super::BeliefGrid;
use crate::model::position::{Position, manhattan};
use serde::Serialize;

/// Quality of one ghost's belief against its true position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeliefMetrics {
    pub ghost: usize,
    pub max_belief: f64,
    pub argmax: Option<Position>,
    /// Manhattan distance between the most probable cell and the true position.
    pub error: Option<usize>,
    pub entropy: f64,
}

impl BeliefMetrics {
    pub fn measure(ghost: usize, belief: &BeliefGrid, truth: Position, removed: bool) -> Self {
        if removed {
            return Self {
                ghost,
                max_belief: 0.0,
                argmax: None,
                error: None,
                entropy: 0.0,
            };
        }

        let best = belief.argmax();
        Self {
            ghost,
            max_belief: best.map(|(_, mass)| mass).unwrap_or(0.0),
            argmax: best.map(|(position, _)| position),
            error: best.map(|(position, _)| manhattan(position, truth)),
            entropy: belief.entropy(),
        }
    }
}

pub fn measure_all(beliefs: &[BeliefGrid], truths: &[Position], removed: &[bool]) -> Vec<BeliefMetrics> {
    beliefs
        .iter()
        .zip(truths)
        .zip(removed)
        .enumerate()
        .map(|(ghost, ((belief, truth), removed))| {
            BeliefMetrics::measure(ghost, belief, *truth, *removed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_mass_on_truth_has_zero_error() {
        let truth = Position::new(2, 1);
        let belief = BeliefGrid::point(4, 4, truth).unwrap();
        let metrics = BeliefMetrics::measure(0, &belief, truth, false);
        assert_eq!(metrics.max_belief, 1.0);
        assert_eq!(metrics.error, Some(0));
        assert_eq!(metrics.entropy, 0.0);
    }

    #[test]
    fn removed_and_empty_beliefs_report_nothing() {
        let belief = BeliefGrid::point(4, 4, Position::new(3, 3)).unwrap();
        let removed = BeliefMetrics::measure(1, &belief, Position::new(0, 0), true);
        assert_eq!(removed.error, None);
        assert_eq!(removed.max_belief, 0.0);

        let all = measure_all(
            &[belief, BeliefGrid::zeros(4, 4)],
            &[Position::new(1, 3), Position::new(0, 0)],
            &[false, false],
        );
        assert_eq!(all[0].error, Some(2));
        assert_eq!(all[1].argmax, None);
    }
}
