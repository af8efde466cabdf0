use crate::config::Config;
use crate::docker::ContainerCommand;

/// Build a `ps` listing the ids of containers whose name contains
/// `container_name`. Stopped containers are included with `include_stopped`.
pub fn list_command(cfg: &Config, include_stopped: bool) -> ContainerCommand {
    let mut args = vec!["ps".to_string()];
    if include_stopped {
        args.push("-a".into());
    }
    args.extend([
        "-q".into(),
        "--filter".into(),
        format!("name={}", cfg.container_name),
    ]);
    ContainerCommand::new(args)
}

pub fn stop_command(ids: &[String]) -> ContainerCommand {
    ContainerCommand::new(std::iter::once("stop").chain(ids.iter().map(String::as_str)))
}

pub fn remove_command(ids: &[String]) -> ContainerCommand {
    ContainerCommand::new(std::iter::once("rm").chain(ids.iter().map(String::as_str)))
}

/// Build the detached `run` for a fresh pgpool container.
///
/// Variables are forwarded by name only (`-e NAME`); their values travel in
/// the runtime process's environment and never appear in its argv.
pub fn run_command(cfg: &Config) -> ContainerCommand {
    let mut args = vec![
        "run".to_string(),
        "-d".into(),
        "--name".into(),
        cfg.container_name.clone(),
        "-p".into(),
        format!("{}:{}", cfg.host_port, cfg.container_port),
        "-v".into(),
        format!("{}:{}", cfg.config_dir.display(), cfg.config_mount),
    ];

    let env = cfg.container_env();
    for (name, _) in &env {
        args.push("-e".into());
        args.push((*name).to_string());
    }
    args.push(cfg.image.clone());

    ContainerCommand {
        args,
        env: env
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    }
}

pub fn logs_command(cfg: &Config) -> ContainerCommand {
    ContainerCommand::new(["logs", "-f", cfg.container_name.as_str()])
}

/// Parse the id-per-line output of `ps -q`, keeping first-seen order.
pub fn parse_ids(stdout: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}
