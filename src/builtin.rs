use crate::command::{CommandFactory, CommandResult, ExecutableCommand, ExitCode, Outcome};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::{self, Write};

/// Names of every builtin, the fixed table consulted before `PATH`.
pub const BUILTIN_NAMES: [&str; 5] = ["exit", "echo", "type", "pwd", "cd"];

/// Exact, case-sensitive builtin name check.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins run in-process. Whatever they write to `stdout` and `stderr` is
/// captured into the [`CommandResult`] of the invocation.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Build the command from its arguments.
    ///
    /// `Err` carries help or usage text, see [`EarlyExit`].
    fn parse(name: &str, args: &[&str]) -> Result<Self, EarlyExit>;

    /// Executes the command using the capture buffers and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, env: &mut Environment) -> Result<Outcome> {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit_code = <T as BuiltinCommand>::execute(*self, &mut stdout, &mut stderr, env)?;
        Ok(Outcome::Continue(CommandResult::new(
            String::from_utf8_lossy(&stdout),
            String::from_utf8_lossy(&stderr),
            exit_code,
        )))
    }
}

/// Help or usage error reported by the argument parser instead of running a builtin.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl From<EarlyExit> for InvalidArgs {
    fn from(EarlyExit { output, status }: EarlyExit) -> Self {
        Self {
            output,
            is_error: status.is_err(),
        }
    }
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, _env: &mut Environment) -> Result<Outcome> {
        let output = self.output.trim_end();
        Ok(Outcome::Continue(if self.is_error {
            CommandResult::error(output)
        } else {
            CommandResult::success(output)
        }))
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &mut Environment,
        name: &str,
        args: &[String],
    ) -> Result<Option<Box<dyn ExecutableCommand>>> {
        if name != T::name() {
            return Ok(None);
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Ok(Some(match T::parse(name, &args) {
            Ok(cmd) => Box::new(cmd),
            Err(early_exit) => Box::new(InvalidArgs::from(early_exit)),
        }))
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn parse(name: &str, args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[name], args)
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        write!(stdout, "{}", env.current_dir().display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the home directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute, relative to the current directory, or starting with ~. Defaults to the home directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn parse(name: &str, args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[name], args)
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let target = self.target.unwrap_or_else(|| "~".to_string());
        if target.starts_with('~') && env.home_dir().is_none() {
            write!(stderr, "cd: HOME not set")?;
            return Ok(1);
        }

        match env.change_dir(&target) {
            Ok(()) => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                write!(stderr, "cd: {}: No such file or directory", target)?;
                Ok(1)
            }
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => {
                write!(stderr, "cd: {}: Not a directory", target)?;
                Ok(1)
            }
            Err(e) => Err(anyhow::Error::new(e).context(format!("cd: {}", target))),
        }
    }
}

/// Write the arguments to standard output, separated by single spaces.
///
/// Arguments are printed as given; nothing is interpreted as an option.
pub struct Echo {
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn parse(_name: &str, args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Self {
            args: args.iter().map(|arg| arg.to_string()).collect(),
        })
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        write!(stdout, "{}", self.args.join(" "))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Tell how a command name would be interpreted.
pub struct Type {
    #[argh(positional)]
    /// the command name to look up.
    pub name: Option<String>,
}

impl BuiltinCommand for Type {
    fn name() -> &'static str {
        "type"
    }

    fn parse(name: &str, args: &[&str]) -> Result<Self, EarlyExit> {
        Self::from_args(&[name], args)
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let Some(name) = self.name else {
            write!(stderr, "type: missing operand")?;
            return Ok(1);
        };

        if is_builtin(&name) {
            write!(stdout, "{} is a shell builtin", name)?;
        } else {
            match env.find_executable(&name)? {
                Some(path) => write!(stdout, "{} is {}", name, path.display())?,
                None => write!(stdout, "{}: not found", name)?,
            }
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional)]
    /// exit status of the shell, 0 when omitted.
    pub code: Option<String>,
}

impl ExecutableCommand for Exit {
    fn execute(self: Box<Self>, _env: &mut Environment) -> Result<Outcome> {
        let Some(code) = self.code else {
            return Ok(Outcome::Terminate(0));
        };
        Ok(match code.parse::<ExitCode>() {
            Ok(code) => Outcome::Terminate(code),
            Err(_) => Outcome::Continue(CommandResult::error(format!(
                "exit: {}: numeric argument required",
                code
            ))),
        })
    }
}

impl CommandFactory for Factory<Exit> {
    fn try_create(
        &self,
        _env: &mut Environment,
        name: &str,
        args: &[String],
    ) -> Result<Option<Box<dyn ExecutableCommand>>> {
        if name != "exit" {
            return Ok(None);
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Ok(Some(match Exit::from_args(&[name], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(early_exit) => Box::new(InvalidArgs::from(early_exit)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn make_env(current_dir: &Path, home: Option<&Path>) -> Environment {
        let mut vars = HashMap::new();
        if let Some(home) = home {
            vars.insert("HOME".to_string(), home.to_string_lossy().to_string());
        }
        if let Ok(path) = std::env::var("PATH") {
            vars.insert("PATH".to_string(), path);
        }
        Environment::from_parts(vars, current_dir.to_path_buf(), ShellConfig::default())
    }

    fn run<T: BuiltinCommand>(cmd: T, env: &mut Environment) -> (String, String, ExitCode) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = BuiltinCommand::execute(cmd, &mut out, &mut err, env).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
            code,
        )
    }

    fn canonical_temp_dir() -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical = fs::canonicalize(temp.path()).expect("canonicalize failed");
        (temp, canonical)
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let (out, err, code) = run(Pwd {}, &mut env);

        assert_eq!(out, dir.to_string_lossy());
        assert_eq!(err, "");
        assert_eq!(code, 0);
    }

    #[test]
    fn test_echo_joins_with_single_space() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let echo = Echo::parse("echo", &["hello", "world", "-n", "--help"]).ok().unwrap();
        let (out, _, code) = run(echo, &mut env);

        assert_eq!(out, "hello world -n --help");
        assert_eq!(code, 0);

        let (out, _, code) = run(Echo { args: Vec::new() }, &mut env);
        assert_eq!(out, "");
        assert_eq!(code, 0);
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let (_temp, dir) = canonical_temp_dir();
        let (_other, target) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let cmd = Cd {
            target: Some(target.to_string_lossy().to_string()),
        };
        let (_, err, code) = run(cmd, &mut env);

        assert_eq!(code, 0);
        assert_eq!(err, "");
        assert_eq!(env.current_dir(), target);
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let (_temp, dir) = canonical_temp_dir();
        let (_home, home) = canonical_temp_dir();
        let mut env = make_env(&dir, Some(&home));

        let (_, _, code) = run(Cd { target: None }, &mut env);

        assert_eq!(code, 0);
        assert_eq!(env.current_dir(), home);
    }

    #[test]
    fn test_cd_nonexistent_path_reports_error() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let cmd = Cd {
            target: Some("nonexistent".to_string()),
        };
        let (out, err, code) = run(cmd, &mut env);

        assert_eq!(out, "");
        assert_eq!(err, "cd: nonexistent: No such file or directory");
        assert_eq!(code, 1);
        assert_eq!(env.current_dir(), dir);
    }

    #[test]
    fn test_cd_into_file_reports_error() {
        let (_temp, dir) = canonical_temp_dir();
        fs::write(dir.join("plain.txt"), "data").unwrap();
        let mut env = make_env(&dir, None);

        let cmd = Cd {
            target: Some("plain.txt".to_string()),
        };
        let (_, err, code) = run(cmd, &mut env);

        assert_eq!(err, "cd: plain.txt: Not a directory");
        assert_eq!(code, 1);
        assert_eq!(env.current_dir(), dir);
    }

    #[test]
    fn test_type_builtin() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        for name in BUILTIN_NAMES {
            let cmd = Type {
                name: Some(name.to_string()),
            };
            let (out, _, code) = run(cmd, &mut env);
            assert_eq!(out, format!("{} is a shell builtin", name));
            assert_eq!(code, 0);
        }
    }

    #[test]
    fn test_type_not_found() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let cmd = Type {
            name: Some("nonexistent_command_xyz".to_string()),
        };
        let (out, err, code) = run(cmd, &mut env);

        assert_eq!(out, "nonexistent_command_xyz: not found");
        assert_eq!(err, "");
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_type_external_reports_path() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let (out, _, code) = run(Type { name: Some("sh".into()) }, &mut env);

        assert!(out.starts_with("sh is /"), "unexpected output: {}", out);
        assert!(out.ends_with("/sh"));
        assert_eq!(code, 0);
    }

    #[test]
    fn test_type_missing_operand() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let (out, err, code) = run(Type { name: None }, &mut env);

        assert_eq!(out, "");
        assert_eq!(err, "type: missing operand");
        assert_eq!(code, 1);
    }

    #[test]
    fn test_exit_codes() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let outcome = Box::new(Exit { code: None }).execute(&mut env).unwrap();
        assert_eq!(outcome, Outcome::Terminate(0));

        let outcome = Box::new(Exit { code: Some("3".into()) }).execute(&mut env).unwrap();
        assert_eq!(outcome, Outcome::Terminate(3));

        let outcome = Box::new(Exit { code: Some("abc".into()) }).execute(&mut env).unwrap();
        assert_eq!(
            outcome,
            Outcome::Continue(CommandResult::error("exit: abc: numeric argument required"))
        );
    }

    #[test]
    fn test_factory_matches_exact_name_only() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let factory = Factory::<Pwd>::default();
        assert!(factory.try_create(&mut env, "PWD", &[]).unwrap().is_none());
        assert!(factory.try_create(&mut env, "pwd", &[]).unwrap().is_some());
    }

    #[test]
    fn test_unexpected_argument_is_usage_error() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let cmd = Factory::<Pwd>::default()
            .try_create(&mut env, "pwd", &["extra".to_string()])
            .unwrap()
            .unwrap();
        match cmd.execute(&mut env).unwrap() {
            Outcome::Continue(result) => {
                assert_eq!(result.exit_code, 1);
                assert!(result.stderr.contains("extra"), "stderr: {}", result.stderr);
            }
            other => panic!("Expected a result, got {:?}", other),
        }
    }

    #[test]
    fn test_help_is_printed_on_stdout() {
        let (_temp, dir) = canonical_temp_dir();
        let mut env = make_env(&dir, None);

        let cmd = Factory::<Cd>::default()
            .try_create(&mut env, "cd", &["--help".to_string()])
            .unwrap()
            .unwrap();
        match cmd.execute(&mut env).unwrap() {
            Outcome::Continue(result) => {
                assert!(result.is_success());
                assert!(result.stdout.starts_with("Usage: cd"), "stdout: {}", result.stdout);
            }
            other => panic!("Expected a result, got {:?}", other),
        }
        assert_eq!(env.current_dir(), dir);
    }
}
