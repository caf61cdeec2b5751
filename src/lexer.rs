//! A module implementing lexical analysis (tokenization) of a single input line.
//!
//! Quoting follows the usual POSIX shell rules: single quotes keep everything
//! literal, double quotes only honour a handful of backslash escapes, and an
//! unquoted backslash escapes any next character. Adjacent fragments glue into
//! one word, so `'foo'"bar"baz` is the single word `foobarbaz`.

use crate::error::ParseError;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A fully resolved word: quotes stripped and escapes applied.
    Word(String),
    /// Standard output redirection, `>` or `1>`.
    RedirectStdout,
    /// Standard error redirection, `2>`.
    RedirectStderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Escaping,
    EscapingInDoubleQuotes,
}

/// Characters that keep their escaping backslash dropped inside double quotes.
const DOUBLE_QUOTE_ESCAPABLE: [char; 5] = ['"', '\\', '$', '`', '\n'];

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    // true once the pending word got a character or a (possibly empty) quoted fragment
    started: bool,
}

impl LexingFSM {
    /// Creates a new instance of the lexical analysis Finite State Machine.
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Normal,
            buffer: String::new(),
            started: false,
        }
    }

    /// Performs lexical analysis on the input string and returns a vector of tokens.
    ///
    /// # Returns
    /// A vector of tokens on success, or [`ParseError::UnclosedQuote`] when the
    /// input ends inside a quoted fragment.
    fn make_tokens(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Normal => self.handle_normal(ch, &mut out),
                LexingState::SingleQuoted => self.handle_single_quote(ch),
                LexingState::DoubleQuoted => self.handle_double_quote(ch),
                LexingState::Escaping => {
                    self.push(ch);
                    self.state = LexingState::Normal;
                }
                LexingState::EscapingInDoubleQuotes => self.handle_double_quote_escape(ch),
            }
        }

        match self.state {
            LexingState::SingleQuoted => return Err(ParseError::UnclosedQuote('\'')),
            LexingState::DoubleQuoted | LexingState::EscapingInDoubleQuotes => {
                return Err(ParseError::UnclosedQuote('"'));
            }
            // a trailing lone backslash escapes nothing and is dropped
            LexingState::Escaping | LexingState::Normal => {}
        }

        self.finish_word(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn push(&mut self, ch: char) {
        self.buffer.push(ch);
        self.started = true;
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        if !self.buffer.is_empty() {
            out.push(Token::Word(std::mem::take(&mut self.buffer)));
        }
        self.started = false;
    }

    fn handle_normal(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => self.finish_word(out),
            '\\' => self.state = LexingState::Escaping,
            '\'' => {
                self.started = true;
                self.state = LexingState::SingleQuoted;
            }
            '"' => {
                self.started = true;
                self.state = LexingState::DoubleQuoted;
            }
            '>' => {
                self.finish_word(out);
                out.push(Token::RedirectStdout);
            }
            // a file descriptor prefix only counts at the start of a word
            '1' | '2' if !self.started && self.peek_char() == Some('>') => {
                self.read_char();
                out.push(if ch == '1' {
                    Token::RedirectStdout
                } else {
                    Token::RedirectStderr
                });
            }
            c => self.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::Normal,
            c => self.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::Normal,
            '\\' => self.state = LexingState::EscapingInDoubleQuotes,
            c => self.push(c),
        }
    }

    fn handle_double_quote_escape(&mut self, ch: char) {
        if !DOUBLE_QUOTE_ESCAPABLE.contains(&ch) {
            self.push('\\');
        }
        self.push(ch);
        self.state = LexingState::DoubleQuoted;
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Creates and runs the finite state machine to tokenize the input line.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(line: &str) -> Vec<String> {
        split_into_tokens(line)
            .unwrap()
            .into_iter()
            .map(|token| match token {
                Token::Word(w) => w,
                other => panic!("Expected only words, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_unquoted_whitespace_collapses() {
        assert_eq!(words("echo   hello \t  world  "), vec!["echo", "hello", "world"]);
        let line = "ls  -la   /tmp    src";
        let expected: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(words(line), expected);
    }

    #[test]
    fn test_single_quotes_are_literal() {
        assert_eq!(words("echo 'hello     world'"), vec!["echo", "hello     world"]);
        assert_eq!(words(r#"'a\nb \\ \"c'"#), vec![r#"a\nb \\ \"c"#]);
        assert_eq!(words("'my program' arg"), vec!["my program", "arg"]);
    }

    #[test]
    fn test_double_quote_escapes_are_selective() {
        assert_eq!(words(r#"echo "say \"hi\"""#), vec!["echo", r#"say "hi""#]);
        assert_eq!(words(r#""a\\b""#), vec![r"a\b"]);
        assert_eq!(words(r#""\$HOME \`x\`""#), vec!["$HOME `x`"]);
        assert_eq!(words("\"a\\\nb\""), vec!["a\nb"]);
        assert_eq!(words(r#""\n\q\'""#), vec![r"\n\q\'"]);
    }

    #[test]
    fn test_unquoted_backslash_escapes_anything() {
        assert_eq!(words(r"echo hello\ \ world"), vec!["echo", "hello  world"]);
        assert_eq!(words(r#"\'\"\\"#), vec![r#"'"\"#]);
        assert_eq!(words(r"a\nb"), vec!["anb"]);
    }

    #[test]
    fn test_adjacent_fragments_concatenate() {
        assert_eq!(words("'a''b'"), vec!["ab"]);
        assert_eq!(words("a''b"), vec!["ab"]);
        assert_eq!(words(r#"'a'"b""#), vec!["ab"]);
        assert_eq!(words(r#"'foo'bar"baz""#), vec!["foobarbaz"]);
    }

    #[test]
    fn test_empty_quotes_alone_produce_nothing() {
        assert_eq!(words("echo '' \"\""), vec!["echo"]);
        assert!(words("''").is_empty());
    }

    #[test]
    fn test_trailing_backslash_is_dropped() {
        assert_eq!(words(r"echo hi\"), vec!["echo", "hi"]);
        assert!(words(r"\").is_empty());
    }

    #[test]
    fn test_unclosed_quotes_are_errors() {
        assert_eq!(split_into_tokens("echo 'abc"), Err(ParseError::UnclosedQuote('\'')));
        assert_eq!(split_into_tokens("echo \"abc"), Err(ParseError::UnclosedQuote('"')));
        assert_eq!(split_into_tokens(r#"echo "abc\"#), Err(ParseError::UnclosedQuote('"')));
        assert_eq!(split_into_tokens(r#"echo "it's"'"#), Err(ParseError::UnclosedQuote('\'')));
    }

    #[test]
    fn test_redirect_operators() {
        let tokens = split_into_tokens("echo hi > out 1> a 2> b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("echo".into()),
                Token::Word("hi".into()),
                Token::RedirectStdout,
                Token::Word("out".into()),
                Token::RedirectStdout,
                Token::Word("a".into()),
                Token::RedirectStderr,
                Token::Word("b".into()),
            ]
        );
    }

    #[test]
    fn test_redirect_operator_ends_a_word() {
        let tokens = split_into_tokens("echo hi>out").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("echo".into()),
                Token::Word("hi".into()),
                Token::RedirectStdout,
                Token::Word("out".into()),
            ]
        );
    }

    #[test]
    fn test_digit_inside_word_is_not_a_descriptor() {
        let tokens = split_into_tokens("echo a2> x").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("echo".into()),
                Token::Word("a2".into()),
                Token::RedirectStdout,
                Token::Word("x".into()),
            ]
        );
    }

    #[test]
    fn test_quoted_or_escaped_redirects_are_words() {
        assert_eq!(words(r#"echo '>' "2>" \>"#), vec!["echo", ">", "2>", ">"]);
        let tokens = split_into_tokens(r"echo \2>x").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("echo".into()),
                Token::Word("2".into()),
                Token::RedirectStdout,
                Token::Word("x".into()),
            ]
        );
    }

    fn plain_word() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_./-]{1,8}"
    }

    proptest! {
        #[test]
        fn unquoted_whitespace_never_survives(
            parts in prop::collection::vec((plain_word(), "[ \t]{1,4}"), 1..8),
            leading in "[ \t]{0,3}",
        ) {
            let mut line = leading;
            for (word, gap) in &parts {
                line.push_str(word);
                line.push_str(gap);
            }
            let expected: Vec<String> = parts.into_iter().map(|(word, _)| word).collect();
            prop_assert_eq!(words(&line), expected);
        }

        #[test]
        fn single_quotes_are_transparent(content in "[^']{1,24}") {
            prop_assert_eq!(words(&format!("'{}'", content)), vec![content]);
        }

        #[test]
        fn double_quotes_are_transparent(content in "[^\"\\\\]{1,24}") {
            prop_assert_eq!(words(&format!("\"{}\"", content)), vec![content]);
        }

        #[test]
        fn double_quote_backslash_kept_before_ordinary_chars(c in any::<char>()) {
            prop_assume!(!DOUBLE_QUOTE_ESCAPABLE.contains(&c));
            prop_assert_eq!(words(&format!("\"\\{}\"", c)), vec![format!("\\{}", c)]);
        }

        #[test]
        fn double_quote_backslash_dropped_before_special_chars(
            c in prop::sample::select(DOUBLE_QUOTE_ESCAPABLE.to_vec()),
        ) {
            prop_assert_eq!(words(&format!("\"\\{}\"", c)), vec![c.to_string()]);
        }

        #[test]
        fn unbalanced_single_quote_is_rejected(
            prefix in "[a-z ]{0,10}",
            content in "[^']{0,16}",
        ) {
            prop_assert_eq!(
                split_into_tokens(&format!("{}'{}", prefix, content)),
                Err(ParseError::UnclosedQuote('\''))
            );
        }

        #[test]
        fn unbalanced_double_quote_is_rejected(
            prefix in "[a-z ]{0,10}",
            content in "[^\"]{0,16}",
        ) {
            prop_assert_eq!(
                split_into_tokens(&format!("{}\"{}", prefix, content)),
                Err(ParseError::UnclosedQuote('"'))
            );
        }
    }
}
