use std::path::PathBuf;

use clap::Parser;

use ghostwatch_bench::config::{BenchmarkConfig, ResolvedOutputs};
use ghostwatch_bench::episode::EpisodeRunner;
use ghostwatch_bench::logging::init_logging;

/// Episode harness measuring ghost-belief quality.
#[derive(Debug, Parser)]
#[command(
    name = "ghostwatch-bench",
    author,
    version,
    about = "Deterministic belief-filter episode harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of episodes per scenario.
    #[arg(long, value_name = "COUNT")]
    episodes: Option<usize>,

    /// Override the RNG seed episode seeds are drawn from.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the step cap per episode.
    #[arg(long, value_name = "STEPS")]
    max_steps: Option<usize>,

    /// Override the sensor noise variance.
    #[arg(long, value_name = "VARIANCE")]
    variance: Option<f64>,

    /// Exit after validating the configuration (no episode is run).
    #[arg(long)]
    validate_only: bool,

    /// Log target, plan length and search effort for every pursuer decision.
    #[arg(long)]
    log_decision_details: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(episodes) = cli.episodes {
        config.episodes.count = episodes;
    }

    if let Some(seed) = cli.seed {
        config.episodes.seed = Some(seed);
    }

    if let Some(max_steps) = cli.max_steps {
        config.episodes.max_steps = max_steps;
    }

    if let Some(variance) = cli.variance {
        config.sensor.variance = variance;
    }

    if cli.log_decision_details {
        config.logging.decision_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let scenario_count = config.scenario_count();
    let run_id = config.run_id.clone();
    let episodes = config.episodes.count;

    println!(
        "Loaded configuration '{run_id}' with {scenario_count} scenario{} ({episodes} episodes each)",
        if scenario_count == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = EpisodeRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: episode execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} scenarios, {} episodes -> {} rows at {}",
        summary.scenarios,
        summary.episodes_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
