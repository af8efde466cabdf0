use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pgpool_restart::docker::{self, OutputLine};
use pgpool_restart::{config, lifecycle};

#[derive(Parser)]
#[command(name = "pgpool-restart", version)]
#[command(about = "Stop, remove, and relaunch the pgpool container, then follow its logs")]
struct Cli {
    /// Config file (defaults to ./pgpool.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print the runtime commands without running them
    #[arg(long)]
    dry_run: bool,
    /// Exit after launching instead of following the logs
    #[arg(long)]
    no_follow: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let cfg = config::load(cli.config.as_deref(), &cwd)?;

    if cli.dry_run {
        let mut out = std::io::stdout().lock();
        for (step, cmd) in lifecycle::plan(&cfg) {
            match writeln!(out, "{:<7} {}", step.as_str(), cmd.display(&cfg.runtime)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => break,
                Err(e) => return Err(e).context("failed to write plan"),
            }
        }
        return Ok(());
    }

    docker::ensure_available(&cfg.runtime)?;
    let report = lifecycle::restart(&cfg)?;
    for step in &report.steps {
        info!(step = step.step.as_str(), status = ?step.status, targets = ?step.targets);
    }

    if cli.no_follow {
        return Ok(());
    }

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    forward_logs(
        lifecycle::follow_logs(&cfg)?,
        &report.container,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
}

/// Copy the log stream to `out`/`err` until the runtime exits.
///
/// A closed output (`pgpool-restart | head`) ends the follow quietly.
fn forward_logs<I, O, E>(lines: I, container: &str, out: &mut O, err: &mut E) -> Result<()>
where
    I: IntoIterator<Item = OutputLine>,
    O: Write,
    E: Write,
{
    for line in lines {
        let written = match line {
            OutputLine::Stdout(l) => writeln!(out, "{l}"),
            OutputLine::Stderr(l) => writeln!(err, "{l}"),
            OutputLine::Done { success, exit_code } => {
                if !success {
                    bail!("log stream for {container} ended with exit {exit_code:?}");
                }
                return Ok(());
            }
        };
        match written {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::BrokenPipe => return Ok(()),
            Err(e) => return Err(e).context("failed to write log line"),
        }
    }

    Ok(())
}
