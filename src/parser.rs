use crate::error::ParseError;
use crate::lexer::{self, Token};

/// A single command line after quoting, escaping and redirections were resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// The command name (`argv[0]` as typed by the user).
    pub name: String,
    /// Arguments following the command name, in order.
    pub args: Vec<String>,
    /// File that standard output is redirected to, if any.
    pub stdout_target: Option<String>,
    /// File that standard error is redirected to, if any.
    pub stderr_target: Option<String>,
}

impl ParsedCommand {
    /// A command without redirections.
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
            ..Default::default()
        }
    }
}

struct CommandParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl CommandParser {
    fn from(tokens: Vec<Token>) -> Self {
        CommandParser { tokens, pos: 0 }
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Takes the word following a redirection operator.
    fn expect_target(&mut self, operator: &'static str) -> Result<String, ParseError> {
        match self.consume() {
            Some(Token::Word(target)) => Ok(target),
            _ => Err(ParseError::MissingRedirectTarget(operator)),
        }
    }

    fn build_command(mut self) -> Result<Option<ParsedCommand>, ParseError> {
        let mut words = Vec::new();
        let mut stdout_target = None;
        let mut stderr_target = None;
        let mut saw_redirect = false;

        while let Some(token) = self.consume() {
            match token {
                Token::Word(word) => words.push(word),
                // a later redirection of the same stream replaces the earlier one
                Token::RedirectStdout => {
                    stdout_target = Some(self.expect_target(">")?);
                    saw_redirect = true;
                }
                Token::RedirectStderr => {
                    stderr_target = Some(self.expect_target("2>")?);
                    saw_redirect = true;
                }
            }
        }

        let mut words = words.into_iter();
        match words.next() {
            Some(name) => Ok(Some(ParsedCommand {
                name,
                args: words.collect(),
                stdout_target,
                stderr_target,
            })),
            None if saw_redirect => Err(ParseError::MissingCommand),
            None => Ok(None),
        }
    }
}

/// Builds a [`ParsedCommand`] out of a token stream.
///
/// Returns `Ok(None)` when the tokens hold nothing to execute.
pub fn construct_command(tokens: Vec<Token>) -> Result<Option<ParsedCommand>, ParseError> {
    CommandParser::from(tokens).build_command()
}

/// Tokenizes a raw input line and builds the command it describes.
///
/// A blank line (or one made only of empty quotes) yields `Ok(None)`.
///
/// ```
/// use tinysh::tokenize;
/// let cmd = tokenize("echo 'hello   world' > out.txt").unwrap().unwrap();
/// assert_eq!(cmd.name, "echo");
/// assert_eq!(cmd.args, vec!["hello   world"]);
/// assert_eq!(cmd.stdout_target.as_deref(), Some("out.txt"));
/// ```
pub fn tokenize(line: &str) -> Result<Option<ParsedCommand>, ParseError> {
    let tokens = lexer::split_into_tokens(line)?;
    construct_command(tokens)
}
