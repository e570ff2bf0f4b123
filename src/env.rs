//! Environment table consulted during variable expansion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Single-character variable names that are looked up without
/// reading an identifier after them.
pub const SPECIAL_NAMES: [char; 6] = ['0', '*', '#', '@', '?', '$'];

/// Whether `c` names a special variable (`$0`, `$*`, `$#`, `$@`, `$?`, `$$`).
pub fn is_special(c: char) -> bool {
    SPECIAL_NAMES.contains(&c)
}

/// Name → value mapping handed to the scanner.
///
/// The table is built once by the caller and only read while parsing, so a
/// single `Env` can be shared across any number of parses. Ordinary names
/// that are not bound expand to the empty string. Special names live in the
/// same map under their one-character key but are looked up through
/// [`Env::special`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `NAME=VALUE` strings.
    ///
    /// Each entry is split at its first `=`. An entry without `=` binds the
    /// whole entry to the empty string. Later entries win.
    pub fn from_assignments<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut env = Self::new();
        for entry in entries {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((name, value)) => env.insert(name, value),
                None => env.insert(entry, ""),
            }
        }
        env
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Bind one of the special names. Other characters are ignored.
    pub fn set_special(&mut self, name: char, value: impl Into<String>) {
        if is_special(name) {
            self.vars.insert(name.to_string(), value.into());
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    /// Value of an ordinary variable; unbound names read as `""`.
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Value of a special variable, `None` when `name` is not special or
    /// not bound.
    pub fn special(&self, name: char) -> Option<&str> {
        if !is_special(name) {
            return None;
        }
        let mut key = [0u8; 4];
        self.vars
            .get(&*name.encode_utf8(&mut key))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Env {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut env = Self::new();
        env.extend(iter);
        env
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Env {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}
