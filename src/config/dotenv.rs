//! Reader for the bot's `.env` configuration file
//!
//! The launcher only reads this file (to locate the store); it never validates
//! the bot's secrets and never exports the values into its own environment.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Prefix of SQLite URLs in `DATABASE_URL`
const SQLITE_URL_PREFIX: &str = "sqlite:///";

/// Parsed key-value pairs of a `.env` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotEnv {
    vars: BTreeMap<String, String>,
}

impl DotEnv {
    /// Load a `.env` file. Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> io::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(Self::parse(&content))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn parse(content: &str) -> Self {
        let mut vars = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some(eq_pos) = line.find('=') else {
                continue;
            };
            let key = line[..eq_pos].trim();
            let value = parse_value(line[eq_pos + 1..].trim());

            if !key.is_empty() {
                vars.insert(key.to_string(), value.to_string());
            }
        }
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Store path from `DATABASE_URL`, if it is a non-empty `sqlite:///` URL
    pub fn sqlite_path(&self) -> Option<PathBuf> {
        let url = self.get("DATABASE_URL")?;
        let path = url.strip_prefix(SQLITE_URL_PREFIX)?;
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }
}

/// A quoted value ends at its closing quote and anything after it is dropped.
/// Unquoted values end at the first `#` preceded by whitespace.
fn parse_value(raw: &str) -> &str {
    if let Some(quote) = raw.chars().next().filter(|c| *c == '"' || *c == '\'') {
        if let Some(end) = raw[1..].find(quote) {
            return &raw[1..end + 1];
        }
    }
    let mut prev_is_space = false;
    for (idx, c) in raw.char_indices() {
        if c == '#' && prev_is_space {
            return raw[..idx].trim_end();
        }
        prev_is_space = c.is_whitespace();
    }
    raw
}
