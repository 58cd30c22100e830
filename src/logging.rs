//! Logging for simgpi.
//!
//! Events go through `tracing`. The vendor interfaces classify their own
//! diagnostics; backends map those onto [`LogLevel`] and emit them with
//! [`log_at`] so one filter governs everything.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

use crate::error::{GpiError, GpiResult};

/// Severity scale shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Fine-grained tracing.
    Trace,
    /// Debug output, including expected lookup misses.
    Debug,
    /// Informational messages.
    Info,
    /// Recoverable vendor problems.
    Warning,
    /// Failed vendor operations.
    Error,
    /// Conditions that end the simulation.
    Critical,
}

impl LogLevel {
    const fn filter_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = GpiError;

    fn from_str(s: &str) -> GpiResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" | "fatal" => Ok(Self::Critical),
            other => Err(GpiError::config(format!("unknown log level '{other}'"))),
        }
    }
}

/// Emit `message` at `level` under the given component name.
pub fn log_at(level: LogLevel, component: &str, message: &str) {
    match level {
        LogLevel::Trace => tracing::trace!(component, "{message}"),
        LogLevel::Debug => tracing::debug!(component, "{message}"),
        LogLevel::Info => tracing::info!(component, "{message}"),
        LogLevel::Warning => tracing::warn!(component, "{message}"),
        LogLevel::Error => tracing::error!(component, "{message}"),
        LogLevel::Critical => tracing::error!(component, critical = true, "{message}"),
    }
}

/// Install the process-wide subscriber.
///
/// `RUST_LOG` wins over `level` when set. Calling this more than once is
/// harmless; only the first subscriber sticks.
pub fn init(level: Option<LogLevel>) {
    let default = level.unwrap_or(LogLevel::Info).filter_directive();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("fatal".parse::<LogLevel>().unwrap(), LogLevel::Critical);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(Some(LogLevel::Debug));
        init(None);
        log_at(LogLevel::Critical, "test", "still alive");
    }
}
