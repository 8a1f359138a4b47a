//! # confab-settings
//!
//! Layered environment configuration for confab clients.
//!
//! Values are resolved from two layers with defined precedence:
//! 1. **Process environment** — highest priority
//! 2. **Env file** — a dotenv-style fallback file (`./.env` by default)
//!
//! and a caller-supplied default below both. Each lookup probes a small set
//! of aliases so deployments can use either bare keys (`AGUI_SERVER_URL`) or
//! prefixed ones (`CONFAB_AGUI_SERVER_URL`): the bare key, the `CONFAB_`
//! prefixed key, and the uppercase variants of both, in that order.
//!
//! There is no state machine here — just key lookup. Anything smarter
//! (watching, reloading) belongs to the caller.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;

pub use errors::{Result, SettingsError};
pub use loader::{load_env_file, parse_dot_env};

use std::collections::HashMap;
use std::path::Path;

/// Key prefix probed as an alias on every lookup.
const KEY_PREFIX: &str = "CONFAB_";

/// Default env file consulted by [`Settings::load`].
const DEFAULT_ENV_FILE: &str = ".env";

/// Well-known key: agent endpoint URL.
pub const SERVER_URL_KEY: &str = "AGUI_SERVER_URL";

/// Well-known key: bearer credential for the agent endpoint.
pub const ACCESS_TOKEN_KEY: &str = "ACCESS_TOKEN";

/// Resolved configuration layers.
///
/// Both layers are immutable snapshots taken at load time; lookups are pure
/// after that.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    env_values: HashMap<String, String>,
    file_values: HashMap<String, String>,
}

impl Settings {
    /// Snapshot the process environment and, best-effort, `./.env`.
    ///
    /// A missing or unreadable env file is not an error; the file layer is
    /// simply empty.
    pub fn load() -> Self {
        let file_values = match loader::load_env_file(Path::new(DEFAULT_ENV_FILE)) {
            Ok(values) => values,
            Err(error) => {
                tracing::debug!(%error, "no env file layer");
                HashMap::new()
            }
        };
        Self {
            env_values: std::env::vars().collect(),
            file_values,
        }
    }

    /// Snapshot the process environment plus a specific env file.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        Ok(Self {
            env_values: std::env::vars().collect(),
            file_values: loader::load_env_file(path)?,
        })
    }

    /// Build from explicit layers. Used by tests and embedders that manage
    /// their own sources.
    pub fn from_parts(
        env_values: HashMap<String, String>,
        file_values: HashMap<String, String>,
    ) -> Self {
        Self {
            env_values,
            file_values,
        }
    }

    /// Look up a key through both layers and all aliases.
    pub fn get(&self, key: &str) -> Option<String> {
        let aliases = alias_candidates(key);
        for layer in [&self.env_values, &self.file_values] {
            for alias in &aliases {
                if let Some(value) = layer.get(alias) {
                    return Some(value.clone());
                }
            }
        }
        None
    }

    /// Look up a key, falling back to `default`.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Look up a boolean key. Only `"true"` and `"1"` are truthy; an unset
    /// or empty value yields `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(value) if value.is_empty() => default,
            Some(value) => value == "true" || value == "1",
        }
    }

    /// Look up a numeric key; unset, empty, or unparsable values yield
    /// `default`.
    pub fn get_number(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            None => default,
            Some(value) if value.is_empty() => default,
            Some(value) => value.parse().unwrap_or(default),
        }
    }

    /// The configured agent endpoint URL, if any.
    pub fn server_url(&self) -> Option<String> {
        self.get(SERVER_URL_KEY)
    }

    /// The configured bearer credential, if any.
    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }
}

/// Alias probe order for a key: bare, prefixed, then uppercase variants of
/// both (deduplicated when the key is already uppercase).
fn alias_candidates(key: &str) -> Vec<String> {
    let mut aliases = vec![key.to_string(), format!("{KEY_PREFIX}{key}")];
    let upper = key.to_uppercase();
    if upper != key {
        aliases.push(upper.clone());
        aliases.push(format!("{KEY_PREFIX}{upper}"));
    }
    aliases
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
