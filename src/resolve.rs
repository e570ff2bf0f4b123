//! Backquote resolvers: what a `` `...` `` span is replaced with.

use std::process::{Command, Stdio};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;

/// Turns the raw text between a pair of backquotes into the string that
/// replaces it.
///
/// Any `FnMut(&str) -> Result<String, E>` closure is a resolver.
pub trait Resolver {
    fn resolve(&mut self, raw: &str) -> Result<String, BoxError>;
}

impl<F, E> Resolver for F
where
    F: FnMut(&str) -> Result<String, E>,
    E: Into<BoxError>,
{
    fn resolve(&mut self, raw: &str) -> Result<String, BoxError> {
        self(raw).map_err(Into::into)
    }
}

/// Substitutes the raw text itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Literal;

impl Resolver for Literal {
    fn resolve(&mut self, raw: &str) -> Result<String, BoxError> {
        Ok(raw.to_string())
    }
}

/// Refuses every substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reject;

/// Error returned by [`Reject`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("command substitution is disabled: `{0}`")]
pub struct SubstitutionDisabled(pub String);

impl Resolver for Reject {
    fn resolve(&mut self, raw: &str) -> Result<String, BoxError> {
        Err(SubstitutionDisabled(raw.to_string()).into())
    }
}

/// Runs the span with `sh -c` and substitutes its standard output, trailing
/// newlines removed.
#[derive(Debug, Clone)]
pub struct Shell {
    program: String,
}

/// The substituted command exited unsuccessfully.
#[derive(Debug, thiserror::Error)]
#[error("`{command}` exited with {status}")]
pub struct CommandFailed {
    pub command: String,
    pub status: std::process::ExitStatus,
}

impl Shell {
    pub fn new() -> Self {
        Self::with_program("sh")
    }

    /// Use another POSIX-compatible shell, invoked as `<program> -c <raw>`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for Shell {
    fn resolve(&mut self, raw: &str) -> Result<String, BoxError> {
        log::debug!("running `{raw}` with {}", self.program);
        let output = Command::new(&self.program)
            .arg("-c")
            .arg(raw)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;
        if !output.status.success() {
            return Err(CommandFailed {
                command: raw.to_string(),
                status: output.status,
            }
            .into());
        }
        let mut stdout = String::from_utf8(output.stdout)?;
        let trimmed = stdout.trim_end_matches('\n').len();
        stdout.truncate(trimmed);
        Ok(stdout)
    }
}

/// Resolver selected by name in configuration or on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Literal,
    Reject,
    Shell,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Literal => "literal",
            Strategy::Reject => "reject",
            Strategy::Shell => "shell",
        }
    }

    pub fn resolver(self) -> Box<dyn Resolver> {
        match self {
            Strategy::Literal => Box::new(Literal),
            Strategy::Reject => Box::new(Reject),
            Strategy::Shell => Box::new(Shell::new()),
        }
    }
}
