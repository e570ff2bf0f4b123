use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::env::Env;
use crate::resolve::Strategy;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// An overlay named on the command line could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    /// Variables layered over the process environment.
    #[serde(default)]
    pub env: Env,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub backquote: Strategy,
    #[serde(default)]
    pub format: Format,
    #[serde(default = "default_inherit_env")]
    pub inherit_env: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backquote: Strategy::default(),
            format: Format::default(),
            inherit_env: default_inherit_env(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_inherit_env() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".into()
}

/// How the binary prints a parsed pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `[["ls","-la"],["wc"]]`
    #[default]
    Json,
    /// `ls -la | wc`, arguments re-quoted
    Shell,
    /// one argument per line, stages separated by a line holding `|`;
    /// `\`, newlines and a lone `|` argument are backslash-escaped
    Lines,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    replace_env: bool,
    #[serde(default)]
    remove_env: Vec<String>,
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    env: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    backquote: Option<Strategy>,
    format: Option<Format>,
    inherit_env: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

// ── Merge logic ──

/// Merge user variables into the default table.
/// In replace mode: user table replaces default entirely.
/// In merge mode: remove names first, then insert additions (user wins).
fn merge_env(base: &mut Env, add: HashMap<String, String>, remove: &[String], replace: bool) {
    if replace {
        *base = add.into_iter().collect();
    } else {
        for name in remove {
            base.remove(name);
        }
        base.extend(add);
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Default location of the user overlay.
    pub fn user_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".config/cmdline-argv/config.toml"))
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay at `path`, or ~/.config/cmdline-argv/config.toml
    ///    when no path is given (if it exists)
    ///
    /// Settings override, `[env]` extends. `remove_env` subtracts names and
    /// `replace_env = true` drops the default table.
    ///
    /// An explicit `path` must exist and parse. Problems with the implicit
    /// user file are reported on stderr and the defaults are kept.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        match path {
            Some(path) => config.apply_overlay(Self::read_overlay(path)?),
            None => {
                if let Some(overlay) = Self::user_path().and_then(|p| Self::load_user_overlay(&p)) {
                    config.apply_overlay(overlay);
                }
            }
        }
        Ok(config)
    }

    fn load_user_overlay(path: &Path) -> Option<ConfigOverlay> {
        if !path.exists() {
            return None;
        }
        match Self::read_overlay(path) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("cmdline-argv: {e}");
                None
            }
        }
    }

    fn read_overlay(path: &Path) -> Result<ConfigOverlay, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        if let Some(v) = s.backquote {
            self.settings.backquote = v;
        }
        if let Some(v) = s.format {
            self.settings.format = v;
        }
        if let Some(v) = s.inherit_env {
            self.settings.inherit_env = v;
        }
        if let Some(v) = s.log_level {
            self.settings.log_level = v;
        }
        if s.log_file.is_some() {
            self.settings.log_file = s.log_file;
        }

        merge_env(
            &mut self.env,
            overlay.env,
            &overlay.remove_env,
            overlay.replace_env,
        );
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
