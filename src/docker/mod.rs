// Container runtime CLI plumbing: availability check, one-shot execution, streamed output.

pub mod engine;
pub mod run;
pub mod types;

pub use engine::ensure_available;
pub use run::{execute, spawn};
pub use types::{ContainerCommand, ContainerResult, OutputLine};
