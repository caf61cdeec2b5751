//! A tiny interactive shell.
//!
//! Input lines are tokenized with POSIX-like quoting and escaping rules,
//! split into a command with optional `>`, `1>` and `2>` redirections, and
//! run either as one of the builtins (`exit`, `echo`, `type`, `pwd`, `cd`)
//! or as a program found on `PATH`. Lookups on `PATH` go through
//! [`PathResolver`], which keeps directory listings and resolved names in
//! bounded LRU caches.
//!
//! The main entry point is [`Interpreter`], which evaluates whole lines
//! ([`Interpreter::eval_with_output`]) or runs commands by name
//! ([`Interpreter::run`]) using a set of pluggable factories. The public
//! modules [`command`] and [`env`] expose traits and types for implementing
//! your own commands and for interacting with the session state.

pub mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod redirect;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

pub use command::{CommandResult, ExitCode, Outcome};
pub use config::ShellConfig;
pub use env::Environment;
pub use error::{ParseError, ShellError};
pub use parser::{ParsedCommand, tokenize};
pub use path::PathResolver;
