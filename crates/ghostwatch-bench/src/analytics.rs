use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::episode::{EpisodeOutcome, Scenario};

const CONFIDENCE_LEVEL: f64 = 0.95;
const FALLBACK_Z: f64 = 1.96;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("scenario '{0}' recorded before it was registered")]
    UnknownScenario(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Aggregates per-episode outcomes into per-scenario reports.
pub struct AnalyticsCollector {
    run_id: String,
    scenarios: Vec<ScenarioAccumulator>,
}

impl AnalyticsCollector {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            scenarios: Vec::new(),
        }
    }

    /// Registers a scenario; reports keep registration order.
    pub fn register(&mut self, scenario: &Scenario) {
        if self.position(scenario).is_none() {
            self.scenarios.push(ScenarioAccumulator::new(scenario.clone()));
        }
    }

    pub fn record_episode(
        &mut self,
        scenario: &Scenario,
        outcome: &EpisodeOutcome,
    ) -> Result<(), AnalyticsError> {
        let index = self
            .position(scenario)
            .ok_or_else(|| AnalyticsError::UnknownScenario(scenario.label()))?;
        self.scenarios[index].record(outcome);
        Ok(())
    }

    pub fn finalize(self) -> AnalyticsSummary {
        let z = z_score(CONFIDENCE_LEVEL);
        AnalyticsSummary {
            run_id: self.run_id,
            confidence: CONFIDENCE_LEVEL,
            scenarios: self
                .scenarios
                .into_iter()
                .map(|acc| acc.into_report(z))
                .collect(),
        }
    }

    fn position(&self, scenario: &Scenario) -> Option<usize> {
        self.scenarios
            .iter()
            .position(|acc| &acc.scenario == scenario)
    }
}

struct ScenarioAccumulator {
    scenario: Scenario,
    episodes: usize,
    cleared: usize,
    samples: usize,
    /// Per-episode means; episodes without active samples contribute nothing.
    max_belief: Vec<f64>,
    error: Vec<f64>,
    steps: Vec<f64>,
    capture_fraction: Vec<f64>,
}

impl ScenarioAccumulator {
    fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            episodes: 0,
            cleared: 0,
            samples: 0,
            max_belief: Vec::new(),
            error: Vec::new(),
            steps: Vec::new(),
            capture_fraction: Vec::new(),
        }
    }

    fn record(&mut self, outcome: &EpisodeOutcome) {
        self.episodes += 1;
        if outcome.cleared {
            self.cleared += 1;
        }
        self.samples += outcome.max_beliefs.len();
        if let Some(mean) = mean(&outcome.max_beliefs) {
            self.max_belief.push(mean);
        }
        if let Some(mean) = mean(&outcome.errors) {
            self.error.push(mean);
        }
        self.steps.push(outcome.steps as f64);
        if outcome.ghosts > 0 {
            self.capture_fraction
                .push(outcome.captured as f64 / outcome.ghosts as f64);
        }
    }

    fn into_report(self, z: f64) -> ScenarioReport {
        ScenarioReport {
            label: self.scenario.label(),
            layout: self.scenario.layout.clone(),
            behavior: self.scenario.behavior.label().to_string(),
            agent: self.scenario.agent.clone(),
            episodes: self.episodes,
            samples: self.samples,
            clear_rate: if self.episodes == 0 {
                0.0
            } else {
                self.cleared as f64 / self.episodes as f64
            },
            max_belief: Estimate::from_samples(&self.max_belief, z),
            error: Estimate::from_samples(&self.error, z),
            steps: Estimate::from_samples(&self.steps, z),
            capture_fraction: Estimate::from_samples(&self.capture_fraction, z),
        }
    }
}

/// Sample mean with a normal-approximation confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub mean: f64,
    pub ci: (f64, f64),
    pub n: usize,
}

impl Estimate {
    pub fn from_samples(points: &[f64], z: f64) -> Self {
        let (low, high) = confidence_interval(points, z);
        Self {
            mean: mean(points).unwrap_or(0.0),
            ci: (low, high),
            n: points.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub label: String,
    pub layout: String,
    pub behavior: String,
    pub agent: String,
    pub episodes: usize,
    pub samples: usize,
    pub clear_rate: f64,
    pub max_belief: Estimate,
    pub error: Estimate,
    pub steps: Estimate,
    pub capture_fraction: Estimate,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub confidence: f64,
    pub scenarios: Vec<ScenarioReport>,
}

impl AnalyticsSummary {
    pub fn render_markdown(&self) -> String {
        let mut rows = String::new();
        let _ = writeln!(rows, "# Filter Benchmark Summary\n");
        let _ = writeln!(
            rows,
            "Run `{}`; intervals are {:.0}% normal approximations over per-episode means.\n",
            self.run_id,
            self.confidence * 100.0
        );
        rows.push_str("| Scenario | Episodes | Samples | Max belief | CI | Arg-max error | CI | Steps | Captured % | Clear % |\n");
        rows.push_str("|----------|----------|---------|------------|----|---------------|----|-------|------------|---------|\n");

        for report in &self.scenarios {
            let _ = writeln!(
                rows,
                "| {label} | {episodes} | {samples} | {belief:.3} | [{belief_low:.3}, {belief_high:.3}] | {error:.2} | [{error_low:.2}, {error_high:.2}] | {steps:.1} | {captured:.1}% | {clear:.1}% |",
                label = report.label,
                episodes = report.episodes,
                samples = report.samples,
                belief = report.max_belief.mean,
                belief_low = report.max_belief.ci.0,
                belief_high = report.max_belief.ci.1,
                error = report.error.mean,
                error_low = report.error.ci.0,
                error_high = report.error.ci.1,
                steps = report.steps.mean,
                captured = report.capture_fraction.mean * 100.0,
                clear = report.clear_rate * 100.0,
            );
        }

        rows
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}

/// Two-sided standard-normal quantile for `level`.
pub fn z_score(level: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|normal| normal.inverse_cdf(0.5 + level / 2.0))
        .unwrap_or(FALLBACK_Z)
}

fn mean(points: &[f64]) -> Option<f64> {
    if points.is_empty() {
        None
    } else {
        Some(points.iter().sum::<f64>() / points.len() as f64)
    }
}

fn confidence_interval(points: &[f64], z: f64) -> (f64, f64) {
    let Some(mean) = mean(points) else {
        return (0.0, 0.0);
    };
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostwatch_core::belief::BehaviorMode;

    fn scenario(agent: &str) -> Scenario {
        Scenario {
            layout: "open".to_string(),
            behavior: BehaviorMode::Wary,
            agent: agent.to_string(),
        }
    }

    fn outcome(max_beliefs: Vec<f64>, errors: Vec<f64>, cleared: bool) -> EpisodeOutcome {
        EpisodeOutcome {
            steps: 10,
            ghosts: 2,
            captured: if cleared { 2 } else { 1 },
            cleared,
            max_beliefs,
            errors,
        }
    }

    #[test]
    fn z_score_matches_familiar_quantile() {
        assert!((z_score(0.95) - 1.959_964).abs() < 1e-5);
    }

    #[test]
    fn interval_collapses_for_single_sample_and_widens_with_spread() {
        assert_eq!(confidence_interval(&[], 1.96), (0.0, 0.0));
        assert_eq!(confidence_interval(&[0.4], 1.96), (0.4, 0.4));

        let (low, high) = confidence_interval(&[1.0, 3.0], 1.96);
        // mean 2, sample sd sqrt(2), se 1
        assert!((low - 0.04).abs() < 1e-9);
        assert!((high - 3.96).abs() < 1e-9);
    }

    #[test]
    fn collector_averages_per_episode_means() {
        let pursuer = scenario("pursuer");
        let mut collector = AnalyticsCollector::new("unit");
        collector.register(&pursuer);
        collector.register(&pursuer);

        collector
            .record_episode(&pursuer, &outcome(vec![0.2, 0.4], vec![2.0, 4.0], false))
            .expect("registered");
        collector
            .record_episode(&pursuer, &outcome(vec![1.0], vec![0.0], true))
            .expect("registered");

        let summary = collector.finalize();
        assert_eq!(summary.scenarios.len(), 1);
        let report = &summary.scenarios[0];
        assert_eq!(report.label, "open/wary/pursuer");
        assert_eq!(report.episodes, 2);
        assert_eq!(report.samples, 3);
        assert!((report.max_belief.mean - 0.65).abs() < 1e-12);
        assert!((report.error.mean - 1.5).abs() < 1e-12);
        assert!((report.capture_fraction.mean - 0.75).abs() < 1e-12);
        assert_eq!(report.clear_rate, 0.5);

        let markdown = summary.render_markdown();
        assert!(markdown.contains("| open/wary/pursuer | 2 | 3 | 0.650 |"));
    }

    #[test]
    fn unregistered_scenario_is_rejected() {
        let mut collector = AnalyticsCollector::new("unit");
        let err = collector
            .record_episode(&scenario("idle"), &outcome(vec![], vec![], false))
            .expect_err("not registered");
        assert!(matches!(err, AnalyticsError::UnknownScenario(label) if label == "open/wary/idle"));
    }
}
