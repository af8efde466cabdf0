/// A single invocation of the container runtime CLI.
///
/// `args` is the argument list after the runtime binary. `env` is added to
/// the runtime process's environment; it may carry secrets, which is why
/// this type is not `Debug` and [`ContainerCommand::display`] leaves it out.
pub struct ContainerCommand {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl ContainerCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    /// Shell-quoted command line, without environment values.
    pub fn display(&self, runtime: &str) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(runtime);
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

/// Outcome of a command run to completion.
#[derive(Debug)]
pub struct ContainerResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Streamed output from a running runtime process.
#[derive(Debug)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
    Done {
        success: bool,
        exit_code: Option<i32>,
    },
}
