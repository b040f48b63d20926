use std::fs;
use std::path::Path;

use ghostwatch_bench::config::BenchmarkConfig;
use ghostwatch_bench::episode::{EpisodeRunner, RunnerError};
use tempfile::tempdir;

const ROOM: &str = "\
%%%%%%%%%%
%P       %
%  %%%   %
%  %  G  %
%     %  %
%  G     %
%%%%%%%%%%
";

fn load_config(dir: &Path, layout_path: &Path) -> BenchmarkConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
episodes:
  seed: 4242
  count: 3
  max_steps: 40
layouts:
  - name: "room"
    path: "{layout}"
behaviors: ["wary", "erratic"]
agents:
  - name: "idle"
    kind: "idle"
  - name: "pursuer"
    kind: "pursuer"
    heuristic: "belief_weighted"
sensor:
  variance: 1.0
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
logging:
  enable_structured: false
"#,
        layout = layout_path.display(),
        jsonl = dir.join("{run_id}").join("steps.jsonl").display(),
        summary = dir.join("{run_id}").join("summary.md").display(),
    );

    let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn run_once(dir: &Path, layout_path: &Path) -> (String, String) {
    let config = load_config(dir, layout_path);
    let outputs = config.resolved_outputs();
    let runner = EpisodeRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("episodes complete");

    assert_eq!(summary.scenarios, 4);
    assert_eq!(summary.episodes_played, 12);
    assert!(summary.telemetry_path.is_none());

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    assert_eq!(jsonl.lines().count(), summary.rows_written);
    let markdown = fs::read_to_string(&summary.summary_path).expect("summary readable");
    (jsonl, markdown)
}

#[test]
fn episode_smoke_test_is_deterministic_and_well_formed() {
    let dir = tempdir().expect("temp dir");
    let layout_path = dir.path().join("room.lay");
    fs::write(&layout_path, ROOM).expect("layout written");

    let (first, markdown) = run_once(dir.path(), &layout_path);
    let (second, _) = run_once(dir.path(), &layout_path);
    assert_eq!(first, second, "same seed must reproduce identical rows");

    for line in first.lines() {
        let row: serde_json::Value = serde_json::from_str(line).expect("row decodes to JSON");
        let max_belief = row["max_belief"].as_f64().expect("max_belief present");
        assert!((0.0..=1.0 + 1e-9).contains(&max_belief));
        if row["removed"].as_bool() == Some(true) {
            assert_eq!(max_belief, 0.0);
            assert!(row["error"].is_null());
        }
        assert_eq!(row["run_id"], "test_smoke");
    }

    for label in [
        "room/wary/idle",
        "room/wary/pursuer",
        "room/erratic/idle",
        "room/erratic/pursuer",
    ] {
        assert!(markdown.contains(label), "summary missing {label}");
    }
}

#[test]
fn missing_layout_is_reported() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), &dir.path().join("absent.lay"));
    let outputs = config.resolved_outputs();
    let err = EpisodeRunner::new(config, outputs)
        .err()
        .expect("missing layout must fail");
    assert!(matches!(err, RunnerError::Layout(_)));
}
