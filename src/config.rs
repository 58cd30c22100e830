//! Boundary configuration.
//!
//! The core itself reads no environment. The bootstrap reads these variables
//! once to decide which extra libraries load before the interpreter starts and
//! which user entry points run after backends finished registering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GpiError, GpiResult};
use crate::logging::LogLevel;

/// Extra libraries to load before the interpreter starts.
pub const ENV_EXTRA: &str = "GPI_EXTRA";
/// Ordered user entry points.
pub const ENV_USERS: &str = "GPI_USERS";
/// Log level override.
pub const ENV_LOG_LEVEL: &str = "GPI_LOG_LEVEL";

/// Symbol used when an entry omits one.
pub const DEFAULT_ENTRY_SYMBOL: &str = "gpi_entry_point";

/// A shared library plus the `extern "C" fn()` to call in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Path or soname of the library.
    pub library: String,
    /// Symbol to resolve and call.
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

fn default_symbol() -> String {
    DEFAULT_ENTRY_SYMBOL.to_string()
}

impl EntryPoint {
    /// Parse `path[:symbol]`.
    ///
    /// The split is on the last `:` so Windows drive letters survive, unless
    /// what follows is a path separator.
    pub fn parse(text: &str) -> GpiResult<Self> {
        let text = text.trim();
        let (library, symbol) = match text.rsplit_once(':') {
            Some((lib, sym)) if !sym.is_empty() && !sym.contains(['/', '\\']) => (lib, sym),
            _ => (text, DEFAULT_ENTRY_SYMBOL),
        };

        if library.is_empty() {
            return Err(GpiError::config(format!("entry point '{text}' has no library path")));
        }

        Ok(Self {
            library: library.to_string(),
            symbol: symbol.to_string(),
        })
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.library, self.symbol)
    }
}

/// Boundary configuration for one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpiConfig {
    /// Libraries loaded before the interpreter starts.
    #[serde(default)]
    pub extra_libs: Vec<EntryPoint>,
    /// Entry points invoked after all backends registered.
    #[serde(default)]
    pub users: Vec<EntryPoint>,
    /// Logging threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl GpiConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> GpiResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(name, value)` pairs.
    pub fn from_vars<I, K, V>(vars: I) -> GpiResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut cfg = Self::default();
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                ENV_EXTRA => cfg.extra_libs = parse_entry_list(value)?,
                ENV_USERS => cfg.users = parse_entry_list(value)?,
                ENV_LOG_LEVEL if !value.trim().is_empty() => cfg.log_level = Some(value.parse()?),
                _ => {}
            }
        }
        Ok(cfg)
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> GpiResult<Self> {
        serde_json::from_str(json).map_err(|e| GpiError::config(format!("invalid config json: {e}")))
    }
}

fn parse_entry_list(value: &str) -> GpiResult<Vec<EntryPoint>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(EntryPoint::parse)
        .collect()
}
