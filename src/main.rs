//! cmdline-argv: print the pipeline a command line parses into.
//!
//! Reads one command line from the first positional argument (or stdin when
//! it is `-`), expands it against the process environment plus configured
//! variables, and writes the stages as JSON, shell text, or one argument per
//! line.
//!
//! Exit status: 0 on success, 2 on usage or syntax errors, 1 otherwise (including
//! an unreadable `--config` file).

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use cmdline_argv::config::{Config, ConfigError, Format};
use cmdline_argv::resolve::Strategy;
use cmdline_argv::{Env, Error, Pipeline, Stage, assemble, logging, split};

// ─── Command line ────────────────────────────────────

/// Split LINE into pipeline stages. ARGS bind $*, $@ and $#.
#[derive(Debug, Parser)]
#[command(name = "cmdline-argv", version)]
struct Cli {
    /// Output format (default from config: json)
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// How `...` spans are resolved (default from config: literal)
    #[arg(short, long, value_enum)]
    backquote: Option<Strategy>,

    /// Set a variable; repeatable, later wins
    #[arg(short, long, value_name = "NAME=VALUE")]
    env: Vec<String>,

    /// Ignore the process environment
    #[arg(long)]
    no_inherit_env: bool,

    /// Split on spaces and quotes only
    #[arg(long)]
    legacy: bool,

    /// User config overlay; must exist when given
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More logging (repeatable)
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,

    /// Command line to parse, or `-` to read it from stdin
    #[arg(value_name = "LINE|-")]
    line: String,

    /// Positional parameters
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    /// `None` reads the line from stdin.
    fn line(&self) -> Option<&str> {
        (self.line != "-").then_some(self.line.as_str())
    }
}

// ─── Environment ─────────────────────────────────────

/// Process environment (when enabled), then the specials, then config
/// `[env]`, then `--env`. Config and flags may rebind a special.
fn build_env(config: &Config, cli: &Cli) -> Env {
    let mut env = if config.settings.inherit_env && !cli.no_inherit_env {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect::<Env>()
    } else {
        Env::new()
    };
    bind_specials(&mut env, &cli.args);
    env.extend(config.env.iter());
    env.extend(Env::from_assignments(&cli.env).iter());
    env
}

fn bind_specials(env: &mut Env, args: &[String]) {
    let joined = args.join(" ");
    env.set_special('0', env!("CARGO_PKG_NAME"));
    env.set_special('*', joined.clone());
    env.set_special('@', joined);
    env.set_special('#', args.len().to_string());
    env.set_special('?', "0");
    env.set_special('$', std::process::id().to_string());
}

// ─── Output ──────────────────────────────────────────

/// One argument of `--format lines`: kept on a single line and never equal
/// to the `|` separator.
fn escape_line(arg: &str) -> String {
    if arg == "|" {
        return r"\|".into();
    }
    let mut out = String::with_capacity(arg.len());
    for c in arg.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            c => out.push(c),
        }
    }
    out
}

fn render(pipeline: &Pipeline, format: Format) -> Result<String, Failure> {
    Ok(match format {
        Format::Json => serde_json::to_string(pipeline)?,
        Format::Shell => pipeline.to_shell()?,
        Format::Lines => pipeline
            .stages
            .iter()
            .map(|stage| {
                stage
                    .args
                    .iter()
                    .map(|arg| escape_line(arg))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n|\n"),
    })
}

// ─── Entry point ─────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error(transparent)]
    Parse(#[from] Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read stdin: {0}")]
    Stdin(#[from] std::io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to render shell text: {0}")]
    Quote(#[from] shlex::QuoteError),
}

impl Failure {
    fn exit_status(&self) -> u8 {
        match self {
            Failure::Parse(e) if e.is_syntax() => 2,
            _ => 1,
        }
    }
}

fn run(cli: &Cli, config: &Config) -> Result<String, Failure> {
    let line = match cli.line() {
        Some(line) => line.to_string(),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            input
        }
    };

    let pipeline = if cli.legacy {
        let words = split(&line);
        Pipeline {
            stages: if words.is_empty() { Vec::new() } else { vec![Stage::from(words)] },
        }
    } else {
        let env = build_env(config, cli);
        let strategy = cli.backquote.unwrap_or(config.settings.backquote);
        log::debug!("resolving backquotes with {}", strategy.as_str());
        let mut resolver = strategy.resolver();
        assemble(&line, resolver.as_mut(), &env)?
    };

    render(&pipeline, cli.format.unwrap_or(config.settings.format))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = Config::load(cli.config.as_deref())
        .map_err(Failure::from)
        .and_then(|config| {
            logging::init(&config.settings, cli.verbose);
            run(&cli, &config)
        });

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::debug!("failed: {e:?}");
            eprintln!("cmdline-argv: {e}");
            ExitCode::from(e.exit_status())
        }
    }
}

// ─── Tests ───────────────────────────────────────────
