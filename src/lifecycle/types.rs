/// Identifies a step of the restart sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stop,
    Remove,
    Launch,
    Follow,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Stop => "stop",
            Step::Remove => "remove",
            Step::Launch => "launch",
            Step::Follow => "follow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    /// Nothing matched the name filter.
    Skipped,
    /// Best-effort step that failed; the sequence continued.
    Failed,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub step: Step,
    pub status: StepStatus,
    /// Container ids the step acted on.
    pub targets: Vec<String>,
    pub log: String,
}

/// What a restart did.
#[derive(Debug, Clone)]
pub struct RestartReport {
    pub container: String,
    /// Id printed by the runtime for the new container.
    pub container_id: Option<String>,
    pub steps: Vec<StepResult>,
}

impl RestartReport {
    pub fn step(&self, step: Step) -> Option<&StepResult> {
        self.steps.iter().find(|r| r.step == step)
    }
}
