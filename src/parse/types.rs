//! Types produced by the scanner and the assembler.

use serde::Serialize;

/// One lexical unit of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Decoded text: quotes removed, escapes and variables resolved.
    String(String),
    /// `|` — stage boundary
    Pipe,
    /// Raw text between a pair of backquotes, not expanded.
    ReverseQuote(String),
    /// A run of one or more whitespace characters.
    Space,
    /// End of input. Always the last token of a scan.
    End,
}

/// Payload-free discriminant of [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    String,
    Pipe,
    ReverseQuote,
    Space,
    End,
}

impl TokenKind {
    /// Build the token of this kind, attaching `text` where the kind
    /// carries a payload.
    pub(crate) fn with_text(self, text: String) -> Token {
        match self {
            TokenKind::String => Token::String(text),
            TokenKind::Pipe => Token::Pipe,
            TokenKind::ReverseQuote => Token::ReverseQuote(text),
            TokenKind::Space => Token::Space,
            TokenKind::End => Token::End,
        }
    }
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::String(_) => TokenKind::String,
            Token::Pipe => TokenKind::Pipe,
            Token::ReverseQuote(_) => TokenKind::ReverseQuote,
            Token::Space => TokenKind::Space,
            Token::End => TokenKind::End,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Token::String(s) | Token::ReverseQuote(s) => Some(s),
            _ => None,
        }
    }
}

/// One command of a pipeline: its arguments, program name first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Stage {
    pub args: Vec<String>,
}

impl Stage {
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Render the arguments as a shell-quoted command.
    ///
    /// Fails if an argument contains a NUL, which no shell word can hold.
    pub fn to_shell(&self) -> Result<String, shlex::QuoteError> {
        let words = self
            .args
            .iter()
            .map(|arg| shlex::try_quote(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(words.join(" "))
    }
}

impl From<Vec<String>> for Stage {
    fn from(args: Vec<String>) -> Self {
        Self { args }
    }
}

/// Commands connected by `|`, left to right.
///
/// An empty pipeline is the result of a blank command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Stages as plain argument vectors.
    pub fn into_args(self) -> Vec<Vec<String>> {
        self.stages.into_iter().map(|s| s.args).collect()
    }

    /// Render the whole pipeline as shell text, stages joined by ` | `.
    pub fn to_shell(&self) -> Result<String, shlex::QuoteError> {
        let stages = self
            .stages
            .iter()
            .map(Stage::to_shell)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stages.join(" | "))
    }
}
