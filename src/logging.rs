use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};

use crate::config::Settings;

/// Parse a level name, falling back to `warn` for anything unrecognized.
pub fn level_from_str(name: &str) -> LevelFilter {
    LevelFilter::from_str(name.trim()).unwrap_or(LevelFilter::Warn)
}

/// Expand a leading `~` in a configured log path.
pub fn log_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Install the global logger described by `settings`.
///
/// With `log_file` set, records are appended to that file; otherwise they go
/// to stderr. Best-effort: failures are silently ignored (logging must never
/// block parsing).
pub fn init(settings: &Settings, verbosity: u8) {
    let level = match verbosity {
        0 => level_from_str(&settings.log_level),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if level == LevelFilter::Off {
        return;
    }

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();

    if let Some(raw) = settings.log_file.as_deref() {
        let path = log_path(raw);
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        else {
            return;
        };
        let _ = WriteLogger::init(level, config, file);
    } else {
        let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
    }
}
