use crate::env::Environment;
use anyhow::Result;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Everything a finished command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: ExitCode,
}

impl CommandResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Successful result carrying some standard output.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self::new(stdout, "", 0)
    }

    /// Successful result without any output.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Failed result (exit code 1) carrying an error message.
    pub fn error(stderr: impl Into<String>) -> Self {
        Self::new("", stderr, 1)
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// What the shell should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Hand the result to redirection and read the next line.
    Continue(CommandResult),
    /// Stop the shell with the given exit code.
    Terminate(ExitCode),
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// Failures the user caused (bad operands, missing files) come back as a
    /// [`CommandResult`] with a non-zero exit code. `Err` is reserved for
    /// conditions that abort the whole input line, like a program that could
    /// not be spawned.
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Outcome>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `Ok(None)` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &mut Environment,
        name: &str,
        args: &[String],
    ) -> Result<Option<Box<dyn ExecutableCommand>>>;
}
