// Configuration: YAML file, environment overrides, validation.

mod loader;
mod types;

pub use loader::{DEFAULT_FILE, load};
pub use types::{Config, ENV_BACKENDS, ENV_PCP_USER, ENV_PCP_USER_PASSWORD, ENV_PGPOOL_PORT};
