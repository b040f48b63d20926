use ghostwatch_core::belief::{BehaviorMode, MAX_SENSOR_VARIANCE, NoiseModel, SensorConfig};
use ghostwatch_core::search::HeuristicMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_MAX_STEPS: usize = 300;
const NAME_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub episodes: EpisodeConfig,
    pub layouts: Vec<LayoutConfig>,
    #[serde(default = "default_behaviors")]
    pub behaviors: Vec<BehaviorMode>,
    pub agents: Vec<AgentConfig>,
    /// Falls back to `GW_SENSOR_VARIANCE` when the block is omitted.
    #[serde(default = "SensorConfig::from_env")]
    pub sensor: SensorConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_name("run_id", &self.run_id)?;
        self.episodes.validate()?;
        validate_layouts(&self.layouts)?;
        validate_behaviors(&mut self.behaviors)?;
        validate_agents(&self.agents)?;
        validate_sensor(&self.sensor)?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }

    /// Number of (layout, behavior, agent) combinations the run covers.
    pub fn scenario_count(&self) -> usize {
        self.layouts.len() * self.behaviors.len() * self.agents.len()
    }
}

/// Episode sampling configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EpisodeConfig {
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl EpisodeConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(invalid(
                "episodes.count",
                "number of episodes must be greater than zero",
            ));
        }

        if self.max_steps == 0 {
            return Err(invalid("episodes.max_steps", "max_steps must be at least 1"));
        }

        Ok(())
    }
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

/// Maze file plus an optional cap on how many of its ghosts are spawned.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LayoutConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub ghosts: Option<usize>,
}

fn default_behaviors() -> Vec<BehaviorMode> {
    vec![BehaviorMode::from_env()]
}

/// Definition of a pursuit agent.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    /// Falls back to `GW_BELIEF_HEURISTIC` when unset.
    #[serde(default)]
    pub heuristic: Option<HeuristicMode>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Pursuer,
    Idle,
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(label, "path must not be empty"));
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(invalid(label, "resolved path is invalid"));
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub decision_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            decision_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid(field, format!("{field} must not be empty")));
    }

    if !value.chars().all(|c| NAME_ALLOWED.contains(c)) {
        return Err(invalid(
            field,
            format!("{field} may only contain alphanumeric characters, '.', '_' or '-'"),
        ));
    }

    Ok(())
}

fn validate_layouts(layouts: &[LayoutConfig]) -> Result<(), ValidationError> {
    if layouts.is_empty() {
        return Err(invalid("layouts", "at least one layout must be specified"));
    }

    let mut seen = HashSet::new();
    for layout in layouts {
        validate_name("layouts.name", &layout.name)?;
        if layout.path.as_os_str().is_empty() {
            return Err(invalid(
                format!("layouts[{}].path", layout.name),
                "path must not be empty",
            ));
        }
        if layout.ghosts == Some(0) {
            return Err(invalid(
                format!("layouts[{}].ghosts", layout.name),
                "ghost limit must be at least 1",
            ));
        }
        if !seen.insert(layout.name.as_str()) {
            return Err(invalid(
                "layouts",
                format!("layout name '{}' defined more than once", layout.name),
            ));
        }
    }

    Ok(())
}

fn validate_behaviors(behaviors: &mut Vec<BehaviorMode>) -> Result<(), ValidationError> {
    if behaviors.is_empty() {
        return Err(invalid("behaviors", "at least one behavior must be specified"));
    }

    let mut seen = HashSet::new();
    behaviors.retain(|behavior| seen.insert(*behavior));
    Ok(())
}

fn validate_sensor(sensor: &SensorConfig) -> Result<(), ValidationError> {
    if sensor.variance > MAX_SENSOR_VARIANCE {
        return Err(invalid(
            "sensor.variance",
            format!("variance must not exceed {MAX_SENSOR_VARIANCE}"),
        ));
    }
    NoiseModel::from_config(sensor).map_err(|err| invalid("sensor", err.to_string()))?;
    Ok(())
}

fn validate_agents(agents: &[AgentConfig]) -> Result<(), ValidationError> {
    if agents.is_empty() {
        return Err(invalid("agents", "at least one agent must be specified"));
    }

    let mut seen = HashSet::new();
    for agent in agents {
        validate_name("agents.name", &agent.name)?;

        if agent.kind == AgentKind::Idle && agent.heuristic.is_some() {
            return Err(invalid(
                format!("agents[{}].heuristic", agent.name),
                "idle agents do not plan",
            ));
        }

        if !seen.insert(agent.name.as_str()) {
            return Err(invalid(
                "agents",
                format!("agent name '{}' defined more than once", agent.name),
            ));
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "filter_smoke"
episodes:
  seed: 7
  count: 4
layouts:
  - name: "open"
    path: "layouts/large_filter.lay"
  - name: "walls"
    path: "layouts/large_filter_walls.lay"
    ghosts: 2
behaviors: ["confused", "afraid", "scared"]
agents:
  - name: "pursuer"
    kind: "pursuer"
    heuristic: "belief_weighted"
  - name: "idle"
    kind: "idle"
sensor:
  variance: 2.0
outputs:
  jsonl: "bench/out/{run_id}/steps.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    fn parse(yaml: &str) -> BenchmarkConfig {
        serde_yaml::from_str(yaml).expect("parse yaml")
    }

    fn field_of(err: ValidationError) -> String {
        match err {
            ValidationError::InvalidField { field, .. } => field,
        }
    }

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg = parse(BASIC_YAML);
        cfg.validate().expect("validate");

        assert_eq!(cfg.episodes.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(
            cfg.behaviors,
            vec![BehaviorMode::Cautious, BehaviorMode::Wary, BehaviorMode::Erratic]
        );
        assert_eq!(cfg.agents[0].heuristic, Some(HeuristicMode::BeliefWeighted));
        assert_eq!(cfg.sensor.success_probability, 0.5);
        assert_eq!(cfg.scenario_count(), 12);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.jsonl,
            PathBuf::from("bench/out/filter_smoke/steps.jsonl")
        );
    }

    #[test]
    fn behaviors_default_and_deduplicate() {
        let yaml = BASIC_YAML.replace(
            "behaviors: [\"confused\", \"afraid\", \"scared\"]\n",
            "",
        );
        let mut cfg = parse(&yaml);
        cfg.validate().expect("validate");
        assert_eq!(cfg.behaviors, vec![BehaviorMode::from_env()]);

        let yaml = BASIC_YAML.replace("\"afraid\", \"scared\"", "\"wary\", \"afraid\"");
        let mut cfg = parse(&yaml);
        cfg.validate().expect("validate");
        assert_eq!(cfg.behaviors, vec![BehaviorMode::Cautious, BehaviorMode::Wary]);
    }

    #[test]
    fn omitted_sensor_block_reads_environment_defaults() {
        let yaml = BASIC_YAML.replace("sensor:\n  variance: 2.0\n", "");
        let mut cfg = parse(&yaml);
        cfg.validate().expect("validate");
        assert_eq!(cfg.sensor, SensorConfig::from_env());
    }

    #[test]
    fn rejects_duplicate_agents() {
        let yaml = BASIC_YAML.replace("- name: \"idle\"", "- name: \"pursuer\"");
        let mut cfg = parse(&yaml);
        let err = cfg.validate().expect_err("duplicate agents should fail");
        assert_eq!(field_of(err), "agents");
    }

    #[test]
    fn rejects_heuristic_on_idle_agent() {
        let yaml = BASIC_YAML.replace(
            "kind: \"idle\"\n",
            "kind: \"idle\"\n    heuristic: \"manhattan\"\n",
        );
        let mut cfg = parse(&yaml);
        let err = cfg.validate().expect_err("idle agent with heuristic");
        assert_eq!(field_of(err), "agents[idle].heuristic");
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("filter_smoke", "filter smoke");
        let mut cfg = parse(&yaml);
        let err = cfg.validate().expect_err("invalid run id");
        assert_eq!(field_of(err), "run_id");
    }

    #[test]
    fn rejects_bad_sensor_and_episode_counts() {
        let yaml = BASIC_YAML.replace("variance: 2.0", "variance: -1.0");
        let mut cfg = parse(&yaml);
        assert_eq!(field_of(cfg.validate().expect_err("negative variance")), "sensor");

        let yaml = BASIC_YAML.replace("variance: 2.0", "variance: 1.0e12");
        let mut cfg = parse(&yaml);
        assert_eq!(
            field_of(cfg.validate().expect_err("oversized variance")),
            "sensor.variance"
        );

        let yaml = BASIC_YAML.replace("variance: 2.0", "variance: 64.0");
        let mut cfg = parse(&yaml);
        cfg.validate().expect("largest variance is accepted");

        let yaml = BASIC_YAML.replace("count: 4", "count: 0");
        let mut cfg = parse(&yaml);
        assert_eq!(
            field_of(cfg.validate().expect_err("zero episodes")),
            "episodes.count"
        );
    }

    #[test]
    fn rejects_duplicate_layouts_and_zero_ghost_limit() {
        let yaml = BASIC_YAML.replace("name: \"walls\"", "name: \"open\"");
        let mut cfg = parse(&yaml);
        assert_eq!(field_of(cfg.validate().expect_err("duplicate layout")), "layouts");

        let yaml = BASIC_YAML.replace("ghosts: 2", "ghosts: 0");
        let mut cfg = parse(&yaml);
        assert_eq!(
            field_of(cfg.validate().expect_err("zero ghosts")),
            "layouts[walls].ghosts"
        );
    }

    #[test]
    fn outputs_resolve_template_multiple_occurrences() {
        let yaml = BASIC_YAML.replace(
            "bench/out/{run_id}/summary.md",
            "bench/out/{run_id}/{run_id}/summary.md",
        );
        let mut cfg = parse(&yaml);
        cfg.validate().expect("valid");
        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.summary_md,
            PathBuf::from("bench/out/filter_smoke/filter_smoke/summary.md")
        );
    }
}
