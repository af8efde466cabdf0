pub mod commands;
pub mod orchestrator;
mod types;

pub use orchestrator::{follow_logs, plan, restart};
pub use types::{RestartReport, Step, StepResult, StepStatus};
