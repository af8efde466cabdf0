use std::sync::mpsc::Receiver;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::config::Config;
use crate::docker::{self, ContainerCommand, OutputLine};

use super::commands::{
    list_command, logs_command, parse_ids, remove_command, run_command, stop_command,
};
use super::types::{RestartReport, Step, StepResult, StepStatus};

/// Stop and remove any matching containers, then launch a fresh one.
///
/// Stop and remove are best-effort: their failures are logged and recorded
/// in the report but never abort the sequence. A failed launch is an error.
pub fn restart(cfg: &Config) -> Result<RestartReport> {
    let mut steps = Vec::with_capacity(3);

    steps.push(clear(cfg, Step::Stop));
    steps.push(clear(cfg, Step::Remove));

    let launch = run_command(cfg);
    info!(command = %launch.display(&cfg.runtime), "launching {}", cfg.container_name);
    let result = docker::execute(&cfg.runtime, &launch)?;
    if !result.success {
        bail!(
            "failed to launch container {} (exit {}): {}",
            cfg.container_name,
            result
                .exit_code
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            result.stderr.trim()
        );
    }

    let container_id = parse_ids(&result.stdout).into_iter().next();
    info!(
        id = container_id.as_deref().unwrap_or("unknown"),
        "launched {}", cfg.container_name
    );
    steps.push(StepResult {
        step: Step::Launch,
        status: StepStatus::Done,
        targets: container_id.iter().cloned().collect(),
        log: result.stdout,
    });

    Ok(RestartReport {
        container: cfg.container_name.clone(),
        container_id,
        steps,
    })
}

/// Attach to the container's log stream in follow mode.
pub fn follow_logs(cfg: &Config) -> Result<Receiver<OutputLine>> {
    info!("following logs of {}", cfg.container_name);
    docker::spawn(&cfg.runtime, logs_command(cfg))
}

/// Commands a restart would issue, in order. Stop and remove are shown as
/// the listings that select their targets.
pub fn plan(cfg: &Config) -> Vec<(Step, ContainerCommand)> {
    vec![
        (Step::Stop, list_command(cfg, false)),
        (Step::Remove, list_command(cfg, true)),
        (Step::Launch, run_command(cfg)),
        (Step::Follow, logs_command(cfg)),
    ]
}

/// Run the stop or remove step against every container matching the name
/// filter.
fn clear(cfg: &Config, step: Step) -> StepResult {
    let include_stopped = step == Step::Remove;
    let failed = |targets: Vec<String>, log: String| {
        warn!(step = step.as_str(), "{}", log.trim());
        StepResult {
            step,
            status: StepStatus::Failed,
            targets,
            log,
        }
    };

    let listing = match docker::execute(&cfg.runtime, &list_command(cfg, include_stopped)) {
        Ok(r) if r.success => r,
        Ok(r) => return failed(Vec::new(), r.stderr),
        Err(e) => return failed(Vec::new(), format!("{e:#}")),
    };

    let ids = parse_ids(&listing.stdout);
    if ids.is_empty() {
        info!(
            step = step.as_str(),
            "no container matching {:?}", cfg.container_name
        );
        return StepResult {
            step,
            status: StepStatus::Skipped,
            targets: ids,
            log: String::new(),
        };
    }

    let cmd = match step {
        Step::Remove => remove_command(&ids),
        _ => stop_command(&ids),
    };
    match docker::execute(&cfg.runtime, &cmd) {
        Ok(r) if r.success => {
            info!(step = step.as_str(), targets = ?ids, "done");
            StepResult {
                step,
                status: StepStatus::Done,
                targets: ids,
                log: r.stdout,
            }
        }
        Ok(r) => failed(ids, r.stderr),
        Err(e) => failed(ids, format!("{e:#}")),
    }
}
