mod agents;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{BenchmarkConfig, ResolvedOutputs};
use crate::logging::telemetry_dir;
use ghostwatch_bot::{PlannerFeatures, PursuitContext, TelemetryContext};
use ghostwatch_core::belief::metrics::{BeliefMetrics, measure_all};
use ghostwatch_core::belief::{BehaviorMode, BeliefFilter, BeliefTracker, NoiseModel};
use ghostwatch_core::model::direction::Direction;
use ghostwatch_core::model::layout::Layout;
use ghostwatch_core::model::state::{GameState, PursuitState, SearchState};
use ghostwatch_core::{FilterError, LayoutError, StateError};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

pub use agents::AgentBlueprint;

/// One (layout, behavior, agent) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub layout: String,
    pub behavior: BehaviorMode,
    pub agent: String,
}

impl Scenario {
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.layout, self.behavior.label(), self.agent)
    }
}

/// What one episode contributes to the summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeOutcome {
    pub steps: usize,
    pub ghosts: usize,
    pub captured: usize,
    pub cleared: bool,
    /// Max belief of every active ghost at every step.
    pub max_beliefs: Vec<f64>,
    /// Arg-max error of every active ghost at every step.
    pub errors: Vec<f64>,
}

/// Primary entry point for running filter episodes.
pub struct EpisodeRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    layouts: Vec<NamedLayout>,
    agents: Vec<AgentBlueprint>,
    noise: NoiseModel,
    logging_enabled: bool,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub scenarios: usize,
    pub episodes_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

struct NamedLayout {
    name: String,
    layout: Layout,
}

impl EpisodeRunner {
    /// Build a runner from a validated configuration; layouts are read here.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let layouts = config
            .layouts
            .iter()
            .map(|entry| {
                let layout = Layout::from_path(&entry.path)?;
                let layout = match entry.ghosts {
                    Some(limit) => layout.with_ghost_limit(limit),
                    None => layout,
                };
                if layout.ghosts().is_empty() {
                    return Err(RunnerError::NoGhosts {
                        layout: entry.name.clone(),
                    });
                }
                Ok(NamedLayout {
                    name: entry.name.clone(),
                    layout,
                })
            })
            .collect::<Result<Vec<_>, RunnerError>>()?;

        let noise = NoiseModel::from_config(&config.sensor)?;
        let env = PlannerFeatures::from_env();
        let base =
            env.with_decision_logging(env.decision_logging() || config.logging.decision_details);
        let agents = AgentBlueprint::from_configs(&config.agents, base);

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            layouts,
            agents,
            noise,
        })
    }

    /// Execute every scenario, streaming JSONL rows to disk.
    ///
    /// Every scenario replays the same episode seeds.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.episodes.seed.unwrap_or(0));
        let episode_seeds: Vec<u64> = (0..self.config.episodes.count)
            .map(|_| rng.next_u64())
            .collect();

        let mut analytics = AnalyticsCollector::new(self.config.run_id.clone());
        let mut rows_written = 0usize;
        let mut episodes_played = 0usize;
        let mut scenarios = 0usize;

        for layout in &self.layouts {
            for behavior in &self.config.behaviors {
                for agent in &self.agents {
                    let scenario = Scenario {
                        layout: layout.name.clone(),
                        behavior: *behavior,
                        agent: agent.name.clone(),
                    };
                    analytics.register(&scenario);
                    scenarios += 1;

                    for (episode_index, seed) in episode_seeds.iter().enumerate() {
                        let outcome = self.play_episode(
                            &mut writer,
                            &scenario,
                            &layout.layout,
                            agent,
                            episode_index,
                            *seed,
                            &mut rows_written,
                        )?;
                        analytics.record_episode(&scenario, &outcome)?;
                        episodes_played += 1;
                    }
                }
            }
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self
            .logging_enabled
            .then(|| telemetry_dir(&self.outputs).join("telemetry.jsonl"));

        Ok(RunSummary {
            scenarios,
            episodes_played,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn play_episode<W: Write>(
        &self,
        writer: &mut W,
        scenario: &Scenario,
        layout: &Layout,
        agent: &AgentBlueprint,
        episode_index: usize,
        seed: u64,
        rows_written: &mut usize,
    ) -> Result<EpisodeOutcome, RunnerError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = GameState::from_layout(layout, scenario.behavior)?;
        let filter = BeliefFilter::with_noise(self.noise.clone(), scenario.behavior);
        let mut tracker = BeliefTracker::new(filter);
        let mut policy = agent.spawn_policy();

        let ghosts = state.ghost_positions().len();
        let mut outcome = EpisodeOutcome {
            ghosts,
            ..EpisodeOutcome::default()
        };

        for step in 0..self.config.episodes.max_steps {
            if state.is_cleared() {
                break;
            }

            let (beliefs, evidences) = tracker.tick(&state, &mut rng)?;
            let metrics = measure_all(&beliefs, state.ghost_positions(), state.removed_flags());

            let action = {
                let telemetry = TelemetryContext {
                    run_id: &self.config.run_id,
                    episode: episode_index,
                    agent: &agent.name,
                };
                let ctx = PursuitContext::new(&state, &beliefs, step).with_telemetry(telemetry);
                policy.choose_move(&ctx)
            };

            for ((metric, evidence), removed) in metrics
                .iter()
                .zip(&evidences)
                .zip(state.removed_flags())
            {
                if !removed {
                    outcome.max_beliefs.push(metric.max_belief);
                    if let Some(error) = metric.error {
                        outcome.errors.push(error as f64);
                    }
                }

                let row = StepRow {
                    run_id: &self.config.run_id,
                    scenario: scenario.label(),
                    layout: &scenario.layout,
                    behavior: scenario.behavior.label(),
                    agent: &scenario.agent,
                    episode: episode_index,
                    episode_seed: seed,
                    step,
                    pacman: state.pacman_position().to_string(),
                    truth: state.ghost_positions()[metric.ghost].to_string(),
                    removed: *removed,
                    evidence: *evidence,
                    metrics: metric,
                    action,
                };
                serde_json::to_writer(&mut *writer, &row)?;
                writer.write_all(b"\n")?;
                *rows_written += 1;
            }

            self.log_step(scenario, episode_index, step, &metrics, action);

            state = state.apply_pacman_move(action)?;
            state.advance_ghosts(&mut rng);
            outcome.steps = step + 1;
        }

        outcome.captured = ghosts - state.active_ghosts();
        outcome.cleared = state.is_cleared();
        Ok(outcome)
    }

    fn log_step(
        &self,
        scenario: &Scenario,
        episode: usize,
        step: usize,
        metrics: &[BeliefMetrics],
        action: Direction,
    ) {
        if !self.logging_enabled || !tracing::enabled!(Level::INFO) {
            return;
        }

        let tracked: Vec<&BeliefMetrics> = metrics.iter().filter(|m| m.argmax.is_some()).collect();
        let mean_max_belief = if tracked.is_empty() {
            0.0
        } else {
            tracked.iter().map(|m| m.max_belief).sum::<f64>() / tracked.len() as f64
        };

        event!(
            target: "ghostwatch_bench::step",
            Level::INFO,
            run_id = %self.config.run_id,
            scenario = %scenario.label(),
            episode = episode as u32,
            step = step as u32,
            tracked = tracked.len() as u32,
            mean_max_belief,
            action = action.label()
        );
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct StepRow<'a> {
    run_id: &'a str,
    scenario: String,
    layout: &'a str,
    behavior: &'static str,
    agent: &'a str,
    episode: usize,
    episode_seed: u64,
    step: usize,
    pacman: String,
    truth: String,
    removed: bool,
    evidence: f64,
    #[serde(flatten)]
    metrics: &'a BeliefMetrics,
    action: Direction,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to load layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("layout '{layout}' has no ghosts to track")]
    NoGhosts { layout: String },
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("game execution failed: {0}")]
    Game(#[from] StateError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
