use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{Context, Result};
use tracing::debug;

use super::types::{ContainerCommand, ContainerResult, OutputLine};

fn command(runtime: &str, cmd: &ContainerCommand) -> Command {
    let mut process = Command::new(runtime);
    process
        .args(&cmd.args)
        .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    process
}

/// Run a command to completion and capture its output.
///
/// Only a failure to start the process is an error; a non-zero exit is
/// reported through [`ContainerResult::success`].
pub fn execute(runtime: &str, cmd: &ContainerCommand) -> Result<ContainerResult> {
    debug!(command = %cmd.display(runtime), "executing");
    let output = command(runtime, cmd)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run `{}`", cmd.display(runtime)))?;

    Ok(ContainerResult {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Start a command and return a channel that streams its output.
///
/// The caller receives [`OutputLine::Stdout`]/[`OutputLine::Stderr`] as they
/// arrive, followed by exactly one [`OutputLine::Done`].
pub fn spawn(runtime: &str, cmd: ContainerCommand) -> Result<Receiver<OutputLine>> {
    debug!(command = %cmd.display(runtime), "spawning");
    let mut child = command(runtime, &cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn `{}`", cmd.display(runtime)))?;

    let stdout = child.stdout.take().context("child stdout was not piped")?;
    let stderr = child.stderr.take().context("child stderr was not piped")?;

    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        supervise(child, stdout, stderr, tx);
    });

    Ok(rx)
}

fn supervise<O, E>(mut child: Child, stdout: O, stderr: E, tx: Sender<OutputLine>)
where
    O: Read + Send + 'static,
    E: Read + Send + 'static,
{
    let stdout_handle = forward_lines(stdout, tx.clone(), OutputLine::Stdout);
    let stderr_handle = forward_lines(stderr, tx.clone(), OutputLine::Stderr);

    let status = child.wait().ok();

    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let exit_code = status.and_then(|s| s.code());
    // Receiver may be dropped; ignore send errors.
    let _ = tx.send(OutputLine::Done {
        success: exit_code == Some(0),
        exit_code,
    });
}

fn forward_lines<R>(
    source: R,
    tx: Sender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) -> std::thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            // Log output is not guaranteed to be UTF-8; keep reading past bad bytes.
            let line = String::from_utf8_lossy(trim_newline(&buf)).into_owned();
            if tx.send(wrap(line)).is_err() {
                break;
            }
        }
    })
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
