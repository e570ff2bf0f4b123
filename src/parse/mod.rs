pub mod assemble;
pub mod scanner;
pub mod split;
pub mod types;

pub use assemble::assemble;
pub use scanner::{Scanner, scan};
pub use split::split;
pub use types::{Pipeline, Stage, Token, TokenKind};
