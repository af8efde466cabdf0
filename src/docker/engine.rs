use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Verify that the runtime binary exists and its daemon is reachable.
pub fn ensure_available(runtime: &str) -> Result<()> {
    let status = Command::new(runtime)
        .args(["version", "--format", "{{.Server.Version}}"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("failed to invoke `{runtime}`; is it installed and on PATH?"))?;

    if !status.success() {
        bail!("{runtime} daemon is not running ({status})");
    }
    Ok(())
}
