//! Integration tests for the restart sequence.
//!
//! Most tests drive a fake runtime: a shell script that records each
//! invocation to `calls.log`. `ps -q` prints `ps.out` (running containers),
//! `ps -a -q` prints `ps_all.out` (all containers), and `fail_<subcommand>`
//! marker files make that subcommand exit non-zero.
//! The test that needs a real Docker daemon is marked `#[ignore]`.
//! Run with: `cargo test -- --ignored`
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use secrecy::SecretString;

use pgpool_restart::config::Config;
use pgpool_restart::docker::{self, OutputLine};
use pgpool_restart::lifecycle::{self, Step, StepStatus};

const FAKE_RUNTIME: &str = r#"#!/bin/sh
dir="$(dirname "$0")"
echo "$*" >> "$dir/calls.log"
if [ -f "$dir/fail_$1" ]; then
  echo "Error response from daemon: $1 failed" >&2
  exit 1
fi
case "$1" in
  ps)
    case " $* " in
      *" -a "*) cat "$dir/ps_all.out" 2>/dev/null ;;
      *) cat "$dir/ps.out" 2>/dev/null ;;
    esac
    ;;
  stop|rm) for id in "$@"; do [ "$id" = "$1" ] || echo "$id"; done ;;
  run)
    echo "env PGPOOL_BACKENDS=$PGPOOL_BACKENDS PGPOOL_PORT=$PGPOOL_PORT PCP_USER=$PCP_USER PCP_USER_PASSWORD=$PCP_USER_PASSWORD" >> "$dir/calls.log"
    echo "4f1c2d3e5a6b"
    ;;
  logs)
    echo "pgpool-II successfully started"
    echo "checkpoint warning" >&2
    ;;
esac
exit 0
"#;

struct FakeRuntime {
    dir: tempfile::TempDir,
}

impl FakeRuntime {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let script = dir.path().join("docker");
        std::fs::write(&script, FAKE_RUNTIME).expect("failed to write fake runtime");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod fake runtime");
        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.path().join("docker")
    }

    /// Containers that are up; they also show in `ps -a`.
    fn running(&self, ids: &[&str]) {
        self.write_ids("ps.out", ids);
        self.write_ids("ps_all.out", ids);
    }

    /// Containers that exist but have exited; only `ps -a` lists them.
    fn stopped(&self, ids: &[&str]) {
        self.write_ids("ps_all.out", ids);
    }

    fn write_ids(&self, file: &str, ids: &[&str]) {
        std::fs::write(self.dir.path().join(file), ids.join("\n") + "\n").unwrap();
    }

    fn fail(&self, subcommand: &str) {
        std::fs::write(self.dir.path().join(format!("fail_{subcommand}")), "").unwrap();
    }

    fn calls(&self) -> Vec<String> {
        read_lines(&self.dir.path().join("calls.log"))
    }

    fn config(&self) -> Config {
        Config {
            runtime: self.path().display().to_string(),
            backends: "0:10.0.0.5:5432".into(),
            pcp_user: "pcpadmin".into(),
            pcp_user_password: Some(SecretString::new("150282".into())),
            ..Config::default()
        }
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn position(calls: &[String], prefix: &str) -> usize {
    calls
        .iter()
        .position(|c| c.starts_with(prefix))
        .unwrap_or_else(|| panic!("no call starting with {prefix:?} in {calls:?}"))
}

#[test]
fn no_existing_container_still_launches() {
    let rt = FakeRuntime::new();
    let report = lifecycle::restart(&rt.config()).expect("restart should succeed");

    assert_eq!(report.step(Step::Stop).unwrap().status, StepStatus::Skipped);
    assert_eq!(report.step(Step::Remove).unwrap().status, StepStatus::Skipped);
    assert_eq!(report.step(Step::Launch).unwrap().status, StepStatus::Done);
    assert_eq!(report.container_id.as_deref(), Some("4f1c2d3e5a6b"));

    let calls = rt.calls();
    assert!(calls.iter().any(|c| c.starts_with("run ")));
    assert!(!calls.iter().any(|c| c.starts_with("stop") || c.starts_with("rm")));
}

#[test]
fn failing_stop_and_remove_do_not_abort() {
    let rt = FakeRuntime::new();
    rt.running(&["a1b2c3"]);
    rt.fail("stop");
    rt.fail("rm");

    let report = lifecycle::restart(&rt.config()).expect("restart should succeed");

    let stop = report.step(Step::Stop).unwrap();
    assert_eq!(stop.status, StepStatus::Failed);
    assert!(stop.log.contains("stop failed"));
    assert_eq!(report.step(Step::Remove).unwrap().status, StepStatus::Failed);
    assert_eq!(report.step(Step::Launch).unwrap().status, StepStatus::Done);
    assert!(rt.calls().iter().any(|c| c.starts_with("run ")));
}

#[test]
fn failing_listing_does_not_abort() {
    let rt = FakeRuntime::new();
    rt.fail("ps");

    let report = lifecycle::restart(&rt.config()).expect("restart should succeed");
    assert_eq!(report.step(Step::Stop).unwrap().status, StepStatus::Failed);
    assert_eq!(report.step(Step::Remove).unwrap().status, StepStatus::Failed);
    assert!(rt.calls().iter().any(|c| c.starts_with("run ")));
}

#[test]
fn running_container_is_stopped_and_removed_before_launch() {
    let rt = FakeRuntime::new();
    rt.running(&["a1b2c3"]);

    let report = lifecycle::restart(&rt.config()).expect("restart should succeed");
    assert_eq!(report.step(Step::Stop).unwrap().targets, ["a1b2c3"]);
    assert_eq!(report.step(Step::Remove).unwrap().targets, ["a1b2c3"]);

    let calls = rt.calls();
    let list_running = position(&calls, "ps -q --filter name=pgpool");
    let stop = position(&calls, "stop a1b2c3");
    let list_all = position(&calls, "ps -a -q --filter name=pgpool");
    let rm = position(&calls, "rm a1b2c3");
    let run = position(&calls, "run ");
    assert!(list_running < stop);
    assert!(stop < list_all);
    assert!(list_all < rm);
    assert!(rm < run);
}

#[test]
fn stopped_container_is_removed_before_launch() {
    let rt = FakeRuntime::new();
    rt.stopped(&["9e8d7c"]);

    let report = lifecycle::restart(&rt.config()).expect("restart should succeed");
    assert_eq!(report.step(Step::Stop).unwrap().status, StepStatus::Skipped);
    let remove = report.step(Step::Remove).unwrap();
    assert_eq!(remove.status, StepStatus::Done);
    assert_eq!(remove.targets, ["9e8d7c"]);

    let calls = rt.calls();
    assert!(!calls.iter().any(|c| c.starts_with("stop")));
    let list_all = position(&calls, "ps -a -q --filter name=pgpool");
    let rm = position(&calls, "rm 9e8d7c");
    let run = position(&calls, "run ");
    assert!(list_all < rm);
    assert!(rm < run);
}

#[test]
fn launch_uses_ports_mount_env_and_image() {
    let rt = FakeRuntime::new();
    lifecycle::restart(&rt.config()).expect("restart should succeed");

    let calls = rt.calls();
    let run = &calls[position(&calls, "run ")];
    assert_eq!(
        run,
        "run -d --name pgpool -p 54321:5454 \
         -v /opt/python/current/app/pgpool:/etc/pgpool2 \
         -e PGPOOL_BACKENDS -e PGPOOL_PORT -e PCP_USER -e PCP_USER_PASSWORD \
         bettervoice/pgpool2-container:3.3.4"
    );

    let env = &calls[position(&calls, "env ")];
    assert_eq!(
        env,
        "env PGPOOL_BACKENDS=0:10.0.0.5:5432 PGPOOL_PORT=5454 PCP_USER=pcpadmin PCP_USER_PASSWORD=150282"
    );
}

#[test]
fn failed_launch_is_an_error() {
    let rt = FakeRuntime::new();
    rt.fail("run");

    let err = lifecycle::restart(&rt.config()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("failed to launch container pgpool"));
    assert!(message.contains("run failed"));
}

#[test]
fn follow_logs_targets_container_by_name() {
    let rt = FakeRuntime::new();
    let cfg = rt.config();
    lifecycle::restart(&cfg).expect("restart should succeed");

    let lines: Vec<OutputLine> = lifecycle::follow_logs(&cfg)
        .expect("follow should start")
        .into_iter()
        .collect();

    assert!(rt.calls().contains(&"logs -f pgpool".to_string()));
    assert!(lines.iter().any(
        |l| matches!(l, OutputLine::Stdout(s) if s == "pgpool-II successfully started")
    ));
    assert!(
        lines
            .iter()
            .any(|l| matches!(l, OutputLine::Stderr(s) if s == "checkpoint warning"))
    );
    assert!(matches!(
        lines.last(),
        Some(OutputLine::Done { success: true, .. })
    ));
}

#[test]
#[ignore]
fn lists_containers_on_real_docker() {
    docker::ensure_available("docker").expect("docker should be available");
    let cfg = Config {
        pcp_user_password: Some(SecretString::new("unused".into())),
        ..Config::default()
    };
    let cmd = lifecycle::commands::list_command(&cfg, true);
    let result = docker::execute(&cfg.runtime, &cmd).expect("ps should run");
    assert!(result.success, "ps failed: {}", result.stderr);
}
