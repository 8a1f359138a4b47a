//! Dotenv-style file parsing.

use std::collections::HashMap;
use std::path::Path;

use crate::errors::{Result, SettingsError};

/// Parse dotenv-style text into a key/value map.
///
/// Blank lines and `#` comments are skipped, a leading `export ` is
/// accepted, everything after the first `=` is the value, and a matched
/// pair of surrounding single or double quotes is stripped.
pub fn parse_dot_env(text: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in text.lines() {
        let mut line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("export ") {
            line = rest.trim_start();
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let mut value = value.trim();
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        let _ = out.insert(key.to_string(), value.to_string());
    }
    out
}

/// Read and parse an env file from disk.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_dot_env(&text))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
