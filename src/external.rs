use crate::command::{CommandFactory, CommandResult, ExecutableCommand, ExitCode, Outcome};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use anyhow::{Context, Result, anyhow};
use log::debug;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

/// Command that is not a builtin.
pub struct ExternalCommand {
    /// Name as typed by the user, passed on as `argv[0]`.
    name: String,
    /// Executable the name resolved to.
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(name: String, program: PathBuf, args: Vec<String>) -> Self {
        Self {
            name,
            program,
            args,
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &mut Environment,
        name: &str,
        args: &[String],
    ) -> Result<Option<Box<dyn ExecutableCommand>>> {
        let Some(program) = env.find_executable(name)? else {
            return Ok(None);
        };
        Ok(Some(Box::new(ExternalCommand::new(
            name.to_string(),
            program,
            args.to_vec(),
        ))))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Outcome> {
        let mut cmd = std::process::Command::new(&self.program);
        set_arg0(&mut cmd, &self.name);
        cmd.args(&self.args)
            .envs(env.vars())
            .current_dir(env.current_dir())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("spawning {} as {:?} {:?}", self.program.display(), self.name, self.args);
        let mut child = cmd.spawn().map_err(|source| ShellError::Spawn {
            command: self.name.clone(),
            source,
        })?;

        // Both pipes are drained while the child runs; reading them one after
        // the other deadlocks once the unread pipe buffer fills up.
        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (drain(stdout), drain(stderr)),
            (stdout, _) => {
                reap(&mut child);
                let stream = if stdout.is_none() { "stdout" } else { "stderr" };
                return Err(ShellError::StreamUnavailable {
                    command: self.name.clone(),
                    stream,
                }
                .into());
            }
        };

        let status = child.wait();
        if status.is_err() {
            reap(&mut child);
        }
        let (status, stdout, stderr) = finish(&self.name, status, stdout, stderr)?;

        let exit_code = match status.code() {
            Some(x) => x,
            None => terminated_by_signal(status),
        };
        debug!("{} exited with {}", self.name, exit_code);

        Ok(Outcome::Continue(CommandResult::new(
            stdout.trim_end(),
            stderr.trim_end(),
            exit_code,
        )))
    }
}

fn drain<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

/// Join both readers, then report the first failure, if any.
fn finish(
    command: &str,
    status: io::Result<ExitStatus>,
    stdout: JoinHandle<io::Result<Vec<u8>>>,
    stderr: JoinHandle<io::Result<Vec<u8>>>,
) -> Result<(ExitStatus, String, String)> {
    let stdout = collect(stdout, command, "stdout");
    let stderr = collect(stderr, command, "stderr");
    let status = status.with_context(|| format!("{}: failed to wait for process", command))?;
    Ok((status, stdout?, stderr?))
}

fn collect(
    handle: JoinHandle<io::Result<Vec<u8>>>,
    command: &str,
    stream: &'static str,
) -> Result<String> {
    let bytes = handle
        .join()
        .map_err(|_| anyhow!("{}: {} reader panicked", command, stream))?
        .map_err(|source| {
            anyhow::Error::new(source).context(ShellError::StreamUnavailable {
                command: command.to_string(),
                stream,
            })
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn set_arg0(cmd: &mut std::process::Command, name: &str) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(name);
}

#[cfg(not(unix))]
fn set_arg0(_cmd: &mut std::process::Command, _name: &str) {}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match ExitStatusExt::signal(&exit_status) {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}
