use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Keeps the background writer alive; dropping it flushes pending events.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Crates whose events land in the telemetry file at the configured level.
const TELEMETRY_TARGETS: [&str; 3] = ["ghostwatch_core", "ghostwatch_bot", "ghostwatch_bench"];

/// Installs a JSON subscriber writing `telemetry.jsonl` next to the summary.
///
/// `RUST_LOG` overrides the filter; otherwise only ghostwatch targets pass below `warn`.
/// Returns `None` when structured logging is disabled.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let telemetry_dir = telemetry_dir(outputs);
    fs::create_dir_all(&telemetry_dir).with_context(|| {
        format!(
            "creating telemetry directory at {}",
            telemetry_dir.display()
        )
    })?;

    let telemetry_path = telemetry_dir.join("telemetry.jsonl");
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // A global subscriber may already be installed (tests, embedding binaries).
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

pub fn telemetry_dir(outputs: &ResolvedOutputs) -> PathBuf {
    outputs
        .summary_md
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `warn` for dependencies, `level` for the ghostwatch crates.
fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    TELEMETRY_TARGETS
        .iter()
        .fold(String::from("warn"), |mut directives, target| {
            directives.push_str(&format!(",{target}={level}"));
            directives
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_scope_level_to_ghostwatch_targets() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,ghostwatch_core=debug,ghostwatch_bot=debug,ghostwatch_bench=debug"
        );
        assert!(default_directives(Level::TRACE).parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn telemetry_dir_falls_back_to_current_directory() {
        let bare = ResolvedOutputs {
            jsonl: PathBuf::from("steps.jsonl"),
            summary_md: PathBuf::from("summary.md"),
        };
        assert_eq!(telemetry_dir(&bare), PathBuf::from("."));

        let nested = ResolvedOutputs {
            jsonl: PathBuf::from("out/run/steps.jsonl"),
            summary_md: PathBuf::from("out/run/summary.md"),
        };
        assert_eq!(telemetry_dir(&nested), PathBuf::from("out/run"));
    }
}
