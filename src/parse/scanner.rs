//! Single-pass scanner turning a command line into [`Token`]s.
//!
//! The scanner is a small state machine. [`step`] maps the current [`Mode`]
//! and the next code point to a new mode plus an [`Action`]; [`Scanner`]
//! carries out the action, which is where escape decoding and variable
//! expansion need one extra code point of lookahead. At most one code point
//! is ever pushed back.

use std::str::Chars;

use super::types::{Token, TokenKind};
use crate::env::{self, Env};
use crate::error::SyntaxError;

/// Lexical mode of the scanner within one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Before the first code point of a token.
    Initial,
    /// Inside a run of whitespace.
    Space,
    /// Between backquotes.
    Backquote,
    /// Unquoted text.
    Bare,
    SingleQuote,
    DoubleQuote,
    /// Reading a variable name that started in unquoted text.
    BareVariable,
    /// Reading a variable name that started inside double quotes.
    QuotedVariable,
}

impl Mode {
    /// Mode that reads a variable name started from `self`.
    fn variable(self) -> Mode {
        match self {
            Mode::Bare => Mode::BareVariable,
            Mode::DoubleQuote => Mode::QuotedVariable,
            other => other,
        }
    }

    /// Mode to return to once a variable name ends.
    fn resume(self) -> Mode {
        match self {
            Mode::BareVariable => Mode::Bare,
            Mode::QuotedVariable => Mode::DoubleQuote,
            other => other,
        }
    }

    fn is_delimited(self) -> bool {
        matches!(self, Mode::SingleQuote | Mode::DoubleQuote | Mode::Backquote)
    }
}

/// What the scanner does with the code point it just read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Consume it, output nothing.
    Skip,
    /// Append it to the token text.
    Keep,
    /// Push it back and read it again in the new mode.
    Reprocess,
    /// Consume it and return a token of this kind.
    Emit(TokenKind),
    /// Push it back and return a token of this kind.
    Finish(TokenKind),
    /// Backslash in unquoted text: take the next code point verbatim.
    EscapeVerbatim,
    /// Backslash inside quotes: decode the next code point through the
    /// escape table.
    EscapeDecode,
    /// `$`: the next code point decides how to expand.
    Dollar,
    /// Identifier character of a variable name.
    NameChar,
    /// The variable name ended: splice its value, push the code point back.
    NameEnd,
    Fail(Failure),
}

/// Input ended inside a delimited span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    UnterminatedQuote(char),
    UnterminatedSubstitution,
}

impl Failure {
    fn at(self, offset: usize) -> SyntaxError {
        match self {
            Failure::UnterminatedQuote(quote) => SyntaxError::UnterminatedQuote { quote, offset },
            Failure::UnterminatedSubstitution => SyntaxError::UnterminatedSubstitution { offset },
        }
    }
}

/// Transition function of the scanner. `None` is end of input.
pub(crate) fn step(mode: Mode, c: Option<char>) -> (Mode, Action) {
    use Action::*;

    match mode {
        Mode::Initial => match c {
            None => (mode, Emit(TokenKind::End)),
            Some('|') => (mode, Emit(TokenKind::Pipe)),
            Some('`') => (Mode::Backquote, Skip),
            Some(c) if c.is_whitespace() => (Mode::Space, Skip),
            Some(_) => (Mode::Bare, Reprocess),
        },
        Mode::Space => match c {
            Some(c) if c.is_whitespace() => (mode, Skip),
            _ => (mode, Finish(TokenKind::Space)),
        },
        Mode::Backquote => match c {
            None => (mode, Fail(Failure::UnterminatedSubstitution)),
            Some('`') => (mode, Emit(TokenKind::ReverseQuote)),
            Some(_) => (mode, Keep),
        },
        Mode::Bare => match c {
            None | Some('|' | '`') => (mode, Finish(TokenKind::String)),
            Some(c) if c.is_whitespace() => (mode, Finish(TokenKind::String)),
            Some('\'') => (Mode::SingleQuote, Skip),
            Some('"') => (Mode::DoubleQuote, Skip),
            Some('\\') => (mode, EscapeVerbatim),
            Some('$') => (mode, Dollar),
            Some(_) => (mode, Keep),
        },
        Mode::SingleQuote => match c {
            None => (mode, Fail(Failure::UnterminatedQuote('\''))),
            Some('\'') => (Mode::Bare, Skip),
            Some('\\') => (mode, EscapeDecode),
            Some(_) => (mode, Keep),
        },
        Mode::DoubleQuote => match c {
            None => (mode, Fail(Failure::UnterminatedQuote('"'))),
            Some('"') => (Mode::Bare, Skip),
            Some('\\') => (mode, EscapeDecode),
            Some('$') => (mode, Dollar),
            Some(_) => (mode, Keep),
        },
        Mode::BareVariable | Mode::QuotedVariable => match c {
            Some(c) if is_name_char(c) => (mode, NameChar),
            _ => (mode.resume(), NameEnd),
        },
    }
}

/// Escape table shared by both quote styles.
fn decode_escape(c: char) -> Option<char> {
    match c {
        'a' => Some('\x07'),
        'b' => Some('\x08'),
        'f' => Some('\x0c'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\x0b'),
        '\\' => Some('\\'),
        '$' => Some('$'),
        _ => None,
    }
}

fn is_name_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Pull-based scanner over one command line.
///
/// Call [`Scanner::next_token`] until it returns [`Token::End`] or an error,
/// or use it as an iterator, which stops after either.
pub struct Scanner<'a> {
    env: &'a Env,
    chars: Chars<'a>,
    pushed: Option<char>,
    /// Code points consumed so far.
    offset: usize,
    /// Variable name being read.
    name: String,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, env: &'a Env) -> Self {
        Self {
            env,
            chars: text.chars(),
            pushed: None,
            offset: 0,
            name: String::new(),
            done: false,
        }
    }

    pub fn env(&self) -> &'a Env {
        self.env
    }

    /// Number of code points consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn read(&mut self) -> Option<char> {
        let c = self.pushed.take().or_else(|| self.chars.next());
        if c.is_some() {
            self.offset += 1;
        }
        c
    }

    fn unread(&mut self, c: Option<char>) {
        if let Some(c) = c {
            debug_assert!(self.pushed.is_none(), "only one code point of push-back");
            self.pushed = Some(c);
            self.offset -= 1;
        }
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        let token = self.scan_token()?;
        log::trace!("scanned {token:?} at offset {}", self.offset);
        Ok(token)
    }

    fn scan_token(&mut self) -> Result<Token, SyntaxError> {
        let mut mode = Mode::Initial;
        let mut text = String::new();
        let mut opened_at = self.offset;
        self.name.clear();

        loop {
            let at = self.offset;
            let c = self.read();
            let (mut next, action) = step(mode, c);
            if next.is_delimited() && matches!(mode, Mode::Initial | Mode::Bare) {
                opened_at = at;
            }

            match action {
                Action::Skip => {}
                Action::Keep => text.extend(c),
                Action::Reprocess => self.unread(c),
                Action::Emit(kind) => return Ok(kind.with_text(text)),
                Action::Finish(kind) => {
                    self.unread(c);
                    return Ok(kind.with_text(text));
                }
                Action::EscapeVerbatim => match self.read() {
                    Some(escaped) => text.push(escaped),
                    None => return Err(SyntaxError::UnterminatedEscape { offset: at }),
                },
                Action::EscapeDecode => {
                    let escaped = self.read();
                    match escaped.and_then(decode_escape) {
                        Some(decoded) => text.push(decoded),
                        None => {
                            text.push('\\');
                            self.unread(escaped);
                        }
                    }
                }
                Action::Dollar => {
                    let lookahead = self.read();
                    match lookahead {
                        Some(special) if env::is_special(special) => {
                            if let Some(value) = self.env.special(special) {
                                text.push_str(value);
                            }
                        }
                        Some(first) if is_name_char(first) => {
                            self.name.push(first);
                            next = mode.variable();
                        }
                        _ => {
                            text.push('$');
                            self.unread(lookahead);
                        }
                    }
                }
                Action::NameChar => self.name.extend(c),
                Action::NameEnd => {
                    text.push_str(self.env.get(&self.name));
                    self.name.clear();
                    self.unread(c);
                }
                Action::Fail(failure) => return Err(failure.at(opened_at)),
            }

            mode = next;
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_token();
        self.done = matches!(item, Ok(Token::End) | Err(_));
        Some(item)
    }
}

/// Scan a whole command line, `End` included.
pub fn scan(text: &str, env: &Env) -> Result<Vec<Token>, SyntaxError> {
    Scanner::new(text, env).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Token {
        Token::String(text.into())
    }

    fn bq(text: &str) -> Token {
        Token::ReverseQuote(text.into())
    }

    fn test_env() -> Env {
        Env::from_assignments(["PATH=/bin", "*=a"])
    }

    fn strings(text: &str, env: &Env) -> Vec<String> {
        scan(text, env)
            .unwrap()
            .into_iter()
            .filter_map(|t| match t {
                Token::String(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    // ── step ──

    #[test]
    fn step_initial() {
        assert_eq!(step(Mode::Initial, None), (Mode::Initial, Action::Emit(TokenKind::End)));
        assert_eq!(step(Mode::Initial, Some('|')), (Mode::Initial, Action::Emit(TokenKind::Pipe)));
        assert_eq!(step(Mode::Initial, Some('`')), (Mode::Backquote, Action::Skip));
        assert_eq!(step(Mode::Initial, Some('\t')), (Mode::Space, Action::Skip));
        assert_eq!(step(Mode::Initial, Some('x')), (Mode::Bare, Action::Reprocess));
        assert_eq!(step(Mode::Initial, Some('"')), (Mode::Bare, Action::Reprocess));
    }

    #[test]
    fn step_space_run() {
        assert_eq!(step(Mode::Space, Some(' ')), (Mode::Space, Action::Skip));
        assert_eq!(step(Mode::Space, Some('\u{3000}')), (Mode::Space, Action::Skip));
        assert_eq!(step(Mode::Space, Some('a')), (Mode::Space, Action::Finish(TokenKind::Space)));
        assert_eq!(step(Mode::Space, None), (Mode::Space, Action::Finish(TokenKind::Space)));
    }

    #[test]
    fn step_backquote() {
        assert_eq!(step(Mode::Backquote, Some('$')), (Mode::Backquote, Action::Keep));
        assert_eq!(step(Mode::Backquote, Some('"')), (Mode::Backquote, Action::Keep));
        assert_eq!(
            step(Mode::Backquote, Some('`')),
            (Mode::Backquote, Action::Emit(TokenKind::ReverseQuote))
        );
        assert_eq!(
            step(Mode::Backquote, None),
            (Mode::Backquote, Action::Fail(Failure::UnterminatedSubstitution))
        );
    }

    #[test]
    fn step_bare_terminators_are_not_consumed() {
        for c in [None, Some('|'), Some('`'), Some(' '), Some('\n')] {
            assert_eq!(step(Mode::Bare, c), (Mode::Bare, Action::Finish(TokenKind::String)));
        }
    }

    #[test]
    fn step_bare_switches() {
        assert_eq!(step(Mode::Bare, Some('\'')), (Mode::SingleQuote, Action::Skip));
        assert_eq!(step(Mode::Bare, Some('"')), (Mode::DoubleQuote, Action::Skip));
        assert_eq!(step(Mode::Bare, Some('\\')), (Mode::Bare, Action::EscapeVerbatim));
        assert_eq!(step(Mode::Bare, Some('$')), (Mode::Bare, Action::Dollar));
        assert_eq!(step(Mode::Bare, Some('中')), (Mode::Bare, Action::Keep));
    }

    #[test]
    fn step_single_quote_has_no_expansion() {
        assert_eq!(step(Mode::SingleQuote, Some('$')), (Mode::SingleQuote, Action::Keep));
        assert_eq!(step(Mode::SingleQuote, Some('"')), (Mode::SingleQuote, Action::Keep));
        assert_eq!(step(Mode::SingleQuote, Some('\\')), (Mode::SingleQuote, Action::EscapeDecode));
        assert_eq!(step(Mode::SingleQuote, Some('\'')), (Mode::Bare, Action::Skip));
        assert_eq!(
            step(Mode::SingleQuote, None),
            (Mode::SingleQuote, Action::Fail(Failure::UnterminatedQuote('\'')))
        );
    }

    #[test]
    fn step_double_quote() {
        assert_eq!(step(Mode::DoubleQuote, Some('$')), (Mode::DoubleQuote, Action::Dollar));
        assert_eq!(step(Mode::DoubleQuote, Some('\'')), (Mode::DoubleQuote, Action::Keep));
        assert_eq!(step(Mode::DoubleQuote, Some('|')), (Mode::DoubleQuote, Action::Keep));
        assert_eq!(step(Mode::DoubleQuote, Some('"')), (Mode::Bare, Action::Skip));
        assert_eq!(
            step(Mode::DoubleQuote, None),
            (Mode::DoubleQuote, Action::Fail(Failure::UnterminatedQuote('"')))
        );
    }

    #[test]
    fn step_variable_name() {
        assert_eq!(step(Mode::BareVariable, Some('_')), (Mode::BareVariable, Action::NameChar));
        assert_eq!(step(Mode::QuotedVariable, Some('9')), (Mode::QuotedVariable, Action::NameChar));
        assert_eq!(step(Mode::BareVariable, Some('/')), (Mode::Bare, Action::NameEnd));
        assert_eq!(step(Mode::QuotedVariable, Some('"')), (Mode::DoubleQuote, Action::NameEnd));
        assert_eq!(step(Mode::BareVariable, None), (Mode::Bare, Action::NameEnd));
    }

    // ── token stream ──

    #[test]
    fn mixed_command_line() {
        let text = concat!(
            r#" a aa a'aa' a"aa"a"#,
            "\n\t\t ",
            r#"a$PATH a"$PATH" a'$PATH'"#,
            "\n\t\t ",
            r#"a"$*" a"$0" a"$\""#,
            "\n\t\t ",
            "a| a|a",
            "\n\t\t ",
            r#"a"\A" a"\a\b\f\n\r\t\v\\\$" \t a'\A' a'\t'"#,
            " a`ls /` `ls ~`",
        );
        let expected = vec![
            Token::Space,
            s("a"),
            Token::Space,
            s("aa"),
            Token::Space,
            s("aaa"),
            Token::Space,
            s("aaaa"),
            Token::Space,
            s("a/bin"),
            Token::Space,
            s("a/bin"),
            Token::Space,
            s("a$PATH"),
            Token::Space,
            s("aa"),
            Token::Space,
            s("a"),
            Token::Space,
            s("a$\\"),
            Token::Space,
            s("a"),
            Token::Pipe,
            Token::Space,
            s("a"),
            Token::Pipe,
            s("a"),
            Token::Space,
            s("a\\A"),
            Token::Space,
            s("a\x07\x08\x0c\n\r\t\x0b\\$"),
            Token::Space,
            s("t"),
            Token::Space,
            s("a\\A"),
            Token::Space,
            s("a\t"),
            Token::Space,
            s("a"),
            bq("ls /"),
            Token::Space,
            bq("ls ~"),
            Token::End,
        ];
        assert_eq!(scan(text, &test_env()).unwrap(), expected);
    }

    #[test]
    fn empty_input_is_just_end() {
        assert_eq!(scan("", &Env::new()).unwrap(), vec![Token::End]);
    }

    #[test]
    fn whitespace_run_is_one_token() {
        assert_eq!(
            scan(" \t\n\u{3000} ", &Env::new()).unwrap(),
            vec![Token::Space, Token::End]
        );
    }

    #[test]
    fn empty_quotes_produce_empty_string_token() {
        assert_eq!(
            scan(r#""""#, &Env::new()).unwrap(),
            vec![s(""), Token::End]
        );
    }

    #[test]
    fn backquote_text_is_raw() {
        let env = test_env();
        assert_eq!(
            scan(r#"`echo "$PATH" \n`"#, &env).unwrap(),
            vec![bq(r#"echo "$PATH" \n"#), Token::End]
        );
    }

    #[test]
    fn backquote_ends_bare_text() {
        assert_eq!(
            scan("x`y`z", &Env::new()).unwrap(),
            vec![s("x"), bq("y"), s("z"), Token::End]
        );
    }

    #[test]
    fn bare_escape_is_verbatim() {
        let env = Env::new();
        assert_eq!(strings(r"\t", &env), vec!["t"]);
        assert_eq!(strings(r"\中", &env), vec!["中"]);
        assert_eq!(strings(r"a\ b", &env), vec!["a b"]);
        assert_eq!(strings(r"\|\`\$", &env), vec!["|`$"]);
        assert_eq!(strings(r"\\", &env), vec!["\\"]);
    }

    #[test]
    fn quoted_escape_falls_back_to_backslash() {
        let env = Env::new();
        assert_eq!(strings(r#""\q""#, &env), vec!["\\q"]);
        assert_eq!(strings(r#"'\"'"#, &env), vec!["\\\""]);
        assert_eq!(strings(r"'\n'", &env), vec!["\n"]);
    }

    #[test]
    fn backslash_before_closing_quote_closes_it() {
        assert_eq!(strings(r#""a\"b"#, &Env::new()), vec!["a\\b"]);
    }

    #[test]
    fn variable_boundaries() {
        let env = Env::from_assignments(["HOME=/home/u", "A_1=x"]);
        assert_eq!(strings("$HOME/bin", &env), vec!["/home/u/bin"]);
        assert_eq!(strings("$A_1.txt", &env), vec!["x.txt"]);
        assert_eq!(strings("pre${HOME}", &env), vec!["pre${HOME}"]);
        assert_eq!(strings("$UNSET-x", &env), vec!["-x"]);
        assert_eq!(strings("$HOME", &env), vec!["/home/u"]);
    }

    #[test]
    fn variable_name_stops_at_pipe() {
        let env = Env::from_assignments(["A=x"]);
        assert_eq!(
            scan("$A|b", &env).unwrap(),
            vec![s("x"), Token::Pipe, s("b"), Token::End]
        );
    }

    #[test]
    fn lone_dollar_is_literal() {
        let env = Env::new();
        assert_eq!(strings("a$", &env), vec!["a$"]);
        assert_eq!(strings("$-x", &env), vec!["$-x"]);
        assert_eq!(strings(r#""$""#, &env), vec!["$"]);
        assert_eq!(strings("$ x", &env), vec!["$", "x"]);
    }

    #[test]
    fn special_variables_do_not_read_a_name() {
        let mut env = Env::from_assignments(["0abc=wrong"]);
        env.set_special('$', "4242");
        env.set_special('#', "2");
        assert_eq!(strings("$0abc", &env), vec!["abc"]);
        assert_eq!(strings("$$", &env), vec!["4242"]);
        assert_eq!(strings(r#""$#args""#, &env), vec!["2args"]);
        assert_eq!(strings("$?", &env), vec![""]);
    }

    #[test]
    fn empty_special_splices_nothing() {
        let mut env = Env::new();
        env.set_special('@', "");
        assert_eq!(strings("x$@y", &env), vec!["xy"]);
    }

    #[test]
    fn unterminated_constructs() {
        let env = Env::new();
        assert_eq!(
            scan(r#"a""#, &env),
            Err(SyntaxError::UnterminatedQuote { quote: '"', offset: 1 })
        );
        assert_eq!(
            scan("a'", &env),
            Err(SyntaxError::UnterminatedQuote { quote: '\'', offset: 1 })
        );
        assert_eq!(
            scan(r#"a"\"#, &env),
            Err(SyntaxError::UnterminatedQuote { quote: '"', offset: 1 })
        );
        assert_eq!(
            scan("x `ls ~", &env),
            Err(SyntaxError::UnterminatedSubstitution { offset: 2 })
        );
        assert_eq!(
            scan(r#"x"$A"#, &env),
            Err(SyntaxError::UnterminatedQuote { quote: '"', offset: 1 })
        );
        assert_eq!(
            scan(r"a\", &env),
            Err(SyntaxError::UnterminatedEscape { offset: 1 })
        );
    }

    #[test]
    fn iterator_stops_after_end() {
        let env = Env::new();
        let mut scanner = Scanner::new("a", &env);
        assert_eq!(scanner.next(), Some(Ok(s("a"))));
        assert_eq!(scanner.next(), Some(Ok(Token::End)));
        assert_eq!(scanner.next(), None);
        assert_eq!(scanner.offset(), 1);
    }

    #[test]
    fn iterator_stops_after_error() {
        let env = Env::new();
        let mut scanner = Scanner::new("'", &env);
        assert!(matches!(scanner.next(), Some(Err(_))));
        assert_eq!(scanner.next(), None);
    }
}
