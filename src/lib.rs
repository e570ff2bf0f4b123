//! cmdline-argv: turn a command line into pipeline stages of arguments.
//!
//! A line such as `grep -n "$PATTERN" main.rs | wc -l` is scanned into tokens,
//! then folded into a [`Pipeline`]: one [`Stage`](parse::Stage) per `|`-separated
//! command, each an ordered list of argument strings. Quotes, backslash
//! escapes and `$NAME` expansion are resolved by the scanner; backquoted
//! spans are handed to a caller-supplied [`Resolver`].
//!
//! ```
//! use cmdline_argv::{Env, assemble, resolve::Literal};
//!
//! let env = Env::from_assignments(["DIR=/tmp"]);
//! let pipeline = assemble(r#"ls -la "$DIR" | wc -l"#, &mut Literal, &env).unwrap();
//! assert_eq!(
//!     pipeline.into_args(),
//!     vec![vec!["ls", "-la", "/tmp"], vec!["wc", "-l"]],
//! );
//! ```
//!
//! # Architecture
//!
//! - **[`parse`]** — Scanner state machine, pipeline assembler, legacy word splitter, token and pipeline types.
//! - **[`env`]** — Environment table, including the special `$0 $* $# $@ $? $$` names.
//! - **[`resolve`]** — Backquote resolvers: the trait plus literal, reject and `sh -c` implementations.
//! - **[`error`]** — Syntax and resolver errors.
//! - **[`config`]** — Configuration loading for the binary: embedded defaults + user overlay merge.
//! - **[`logging`]** — Logger setup for the binary.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Variable table consulted by `$` expansion.
pub mod env;
/// Error types.
pub mod error;
/// Logger installation.
pub mod logging;
/// Command line parsing: scanner, assembler, legacy splitter, types.
pub mod parse;
/// Backquote substitution.
pub mod resolve;

pub use env::Env;
pub use error::{BoxError, Error, SyntaxError};
pub use parse::{Pipeline, Stage, Token, assemble, scan, split};
pub use resolve::Resolver;
