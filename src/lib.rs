//! Restart the pgpool container: stop and remove any existing instance,
//! launch a fresh one from the configured image, then follow its logs.

pub mod config;
pub mod docker;
pub mod lifecycle;
