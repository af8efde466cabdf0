use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub const ENV_BACKENDS: &str = "PGPOOL_BACKENDS";
pub const ENV_PGPOOL_PORT: &str = "PGPOOL_PORT";
pub const ENV_PCP_USER: &str = "PCP_USER";
pub const ENV_PCP_USER_PASSWORD: &str = "PCP_USER_PASSWORD";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container runtime binary, looked up on PATH unless absolute.
    pub runtime: String,
    /// Name given to the launched container. Also used as the substring
    /// filter when stopping and removing existing containers.
    pub container_name: String,
    pub image: String,
    pub host_port: u16,
    pub container_port: u16,
    /// Host directory holding the pgpool configuration.
    pub config_dir: PathBuf,
    /// Where `config_dir` is mounted inside the container.
    pub config_mount: String,
    pub backends: String,
    pub pgpool_port: u16,
    pub pcp_user: String,
    /// Never has a default; must come from the config file or
    /// `PCP_USER_PASSWORD`.
    pub pcp_user_password: Option<SecretString>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            container_name: "pgpool".to_string(),
            image: "bettervoice/pgpool2-container:3.3.4".to_string(),
            host_port: 54321,
            container_port: 5454,
            config_dir: PathBuf::from("/opt/python/current/app/pgpool"),
            config_mount: "/etc/pgpool2".to_string(),
            backends: "0:localhost:5432".to_string(),
            pgpool_port: 5454,
            pcp_user: "postgres".to_string(),
            pcp_user_password: None,
        }
    }
}

impl Config {
    /// Override the container variables from the environment.
    ///
    /// `lookup` resolves a variable name to its value; empty values are
    /// treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(backends) = get(ENV_BACKENDS) {
            self.backends = backends;
        }
        if let Some(port) = get(ENV_PGPOOL_PORT) {
            self.pgpool_port = port
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PGPOOL_PORT} is not a valid port: {port:?}"))?;
        }
        if let Some(user) = get(ENV_PCP_USER) {
            self.pcp_user = user;
        }
        if let Some(password) = get(ENV_PCP_USER_PASSWORD) {
            self.pcp_user_password = Some(SecretString::new(password));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("runtime", self.runtime.as_str()),
            ("container_name", self.container_name.as_str()),
            ("image", self.image.as_str()),
            ("backends", self.backends.as_str()),
            ("pcp_user", self.pcp_user.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                bail!("`{field}` must not be empty");
            }
        }

        for (field, port) in [
            ("host_port", self.host_port),
            ("container_port", self.container_port),
            ("pgpool_port", self.pgpool_port),
        ] {
            if port == 0 {
                bail!("`{field}` must be a non-zero port");
            }
        }

        if !self.config_dir.is_absolute() {
            bail!(
                "`config_dir` must be an absolute path, got {}",
                self.config_dir.display()
            );
        }
        if !self.config_mount.starts_with('/') {
            bail!(
                "`config_mount` must be an absolute container path, got {:?}",
                self.config_mount
            );
        }

        match &self.pcp_user_password {
            Some(p) if !p.expose_secret().is_empty() => {}
            _ => bail!(
                "no PCP password configured; set {ENV_PCP_USER_PASSWORD} or `pcp_user_password`"
            ),
        }

        // Env values cannot carry NUL bytes across exec.
        for (name, value) in self.container_env() {
            if value.contains('\0') {
                bail!("{name} contains a NUL byte");
            }
        }

        Ok(())
    }

    /// Variables forwarded to the container, in launch order.
    pub fn container_env(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_BACKENDS, self.backends.clone()),
            (ENV_PGPOOL_PORT, self.pgpool_port.to_string()),
            (ENV_PCP_USER, self.pcp_user.clone()),
            (
                ENV_PCP_USER_PASSWORD,
                self.pcp_user_password
                    .as_ref()
                    .map(|p| p.expose_secret().clone())
                    .unwrap_or_default(),
            ),
        ]
    }
}
