//! Error taxonomy of the shell.
//!
//! Only failures that abort the processing of a whole input line live here.
//! Unknown commands, builtin misuse and non-zero exit codes are ordinary
//! [`CommandResult`](crate::command::CommandResult) values instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while turning an input line into a [`ParsedCommand`](crate::parser::ParsedCommand).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input ended inside a single- or double-quoted fragment.
    #[error("syntax error: unclosed quote, missing closing {0}")]
    UnclosedQuote(char),
    /// A redirection operator was not followed by a file name.
    #[error("syntax error: expected a file name after `{0}`")]
    MissingRedirectTarget(&'static str),
    /// The line holds redirections but no command word.
    #[error("syntax error: redirection without a command")]
    MissingCommand,
}

/// Errors that abort the current input line without stopping the shell.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The external program could not be started at all.
    #[error("{command}: failed to start")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A pipe to the child process could not be opened or read.
    #[error("{command}: {stream} is unavailable")]
    StreamUnavailable {
        command: String,
        stream: &'static str,
    },

    /// A redirection target could not be created or written.
    #[error("{}: cannot write redirection target", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
