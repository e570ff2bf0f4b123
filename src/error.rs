use thiserror::Error;

/// Boxed error produced by a backquote resolver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed input detected by the scanner or the assembler.
///
/// Offsets count code points from the start of the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unterminated {quote} quote opened at offset {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
    #[error("trailing backslash at offset {offset}")]
    UnterminatedEscape { offset: usize },
    #[error("unterminated backquote opened at offset {offset}")]
    UnterminatedSubstitution { offset: usize },
    /// A stage with no arguments: leading, doubled or trailing pipe.
    #[error("empty pipeline stage {stage}")]
    EmptyStage { stage: usize },
}

/// Failure of [`assemble`](crate::assemble).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid syntax: {0}")]
    InvalidSyntax(#[from] SyntaxError),
    /// The resolver's own error, untouched. Downcast it to recover the
    /// concrete type.
    #[error(transparent)]
    Resolver(BoxError),
}

impl Error {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::InvalidSyntax(_))
    }
}
