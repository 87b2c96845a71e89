//! Logging configuration and initialization.

use std::env;

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the default filter directive.
pub const LOG_ENV: &str = "LETSREFINE_LOG";
/// Environment variable selecting `pretty` or `json` output.
pub const LOG_FORMAT_ENV: &str = "LETSREFINE_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Defaults overridden by `LETSREFINE_LOG` and `LETSREFINE_LOG_FORMAT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env::var(LOG_ENV).unwrap_or(defaults.level),
            format: env::var(LOG_FORMAT_ENV).unwrap_or(defaults.format),
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// `RUST_LOG` wins over `level` when set. A second call is a no-op.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        // try_init fails only when a global subscriber already exists
        let _ = match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).try_init(),
            _ => fmt().with_env_filter(filter).try_init(),
        };
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}
