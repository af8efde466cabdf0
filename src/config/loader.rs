use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::types::Config;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_FILE: &str = "pgpool.yaml";

/// Resolve the effective configuration.
///
/// An explicit path must exist. Without one, `pgpool.yaml` in `dir` is
/// read if present and defaults are used otherwise. Environment overrides
/// are applied last, then the result is validated.
pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => read_file(path)?,
        None => {
            let path = dir.join(DEFAULT_FILE);
            if path.exists() {
                read_file(&path)?
            } else {
                debug!("no {DEFAULT_FILE} in {}, using defaults", dir.display());
                Config::default()
            }
        }
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}
