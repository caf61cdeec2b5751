use crate::command::{CommandFactory, CommandResult, ExitCode, Outcome};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::error::ShellError;
use crate::parser::{self, ParsedCommand};
use crate::redirect;
use log::debug;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

const PROMPT: &str = "$ ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// An interactive shell that runs builtins and programs found on `PATH`.
///
/// The interpreter owns the session [`Environment`] and a list of
/// [`CommandFactory`] objects queried in order to create a command by name.
/// See [`Interpreter::with_environment`] for the factories included out of
/// the box.
///
/// Example
/// ```
/// use tinysh::{CommandResult, Interpreter, Outcome};
/// let mut sh = Interpreter::default();
/// let outcome = sh.run("echo", &["hello", "world"]).unwrap();
/// assert_eq!(outcome, Outcome::Continue(CommandResult::success("hello world")));
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    /// Create an interpreter with the default set of commands:
    /// - builtins: `exit`, `echo`, `type`, `pwd`, `cd`
    /// - external command launcher
    ///
    /// Builtins come first, so they shadow programs of the same name.
    pub fn with_environment(env: Environment) -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(
            env,
            vec![
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Echo>::default()),
                Box::new(Factory::<Type>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<ExternalCommand>::default()),
            ],
        )
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Run a single command invocation by name with arguments.
    pub fn run(&mut self, name: &str, args: &[&str]) -> anyhow::Result<Outcome> {
        let args = args.iter().map(|arg| arg.to_string()).collect();
        self.execute(&ParsedCommand::new(name, args))
    }

    /// Execute a parsed command, ignoring its redirections.
    ///
    /// A name no factory recognizes is not an error: it yields a result with
    /// `<name>: command not found` on stderr and exit code 1.
    pub fn execute(&mut self, cmd: &ParsedCommand) -> anyhow::Result<Outcome> {
        for factory in &self.commands {
            if let Some(command) = factory.try_create(&mut self.env, &cmd.name, &cmd.args)? {
                return command.execute(&mut self.env);
            }
        }
        debug!("no command matched {:?}", cmd.name);
        Ok(Outcome::Continue(CommandResult::error(format!(
            "{}: command not found",
            cmd.name
        ))))
    }

    /// Evaluate one input line, sending unredirected output to `out` and `err`.
    ///
    /// Redirection targets resolve against the directory the line started
    /// in, so `cd dir > file` leaves `file` behind in the old directory.
    pub fn eval_with_output(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> anyhow::Result<Outcome> {
        let cmd = match parser::tokenize(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Ok(Outcome::Continue(CommandResult::empty())),
            Err(parse_error) => {
                debug!("rejected {:?}: {}", line, parse_error);
                return Err(ShellError::from(parse_error).into());
            }
        };

        let start_dir = self.env.current_dir().to_path_buf();
        let result = match self.execute(&cmd)? {
            Outcome::Continue(result) => result,
            terminate @ Outcome::Terminate(_) => return Ok(terminate),
        };

        redirect::route(
            &result,
            cmd.stdout_target.as_deref(),
            cmd.stderr_target.as_deref(),
            &start_dir,
            out,
            err,
        )?;
        Ok(Outcome::Continue(result))
    }

    /// Evaluate one input line against the process stdout and stderr.
    pub fn eval(&mut self, line: &str) -> anyhow::Result<Outcome> {
        self.eval_with_output(line, &mut io::stdout().lock(), &mut io::stderr().lock())
    }

    /// Read-Eval-Print Loop.
    ///
    /// Returns the code the shell should exit with: the operand of `exit`,
    /// or 0 at end of input. Errors of a single line are printed and the
    /// loop goes on.
    pub fn repl(&mut self) -> rustyline::Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    match self.eval(&line) {
                        Ok(Outcome::Continue(_)) => {}
                        Ok(Outcome::Terminate(code)) => return Ok(code),
                        Err(err) => eprintln!("{:#}", err),
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(0),
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for Interpreter {
    /// Interpreter over a snapshot of the process environment, see
    /// [`Interpreter::with_environment`].
    fn default() -> Self {
        Self::with_environment(Environment::new(ShellConfig::default()))
    }
}
