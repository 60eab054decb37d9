//! Logging setup for binaries and tests embedding the catalog.
//!
//! The library itself only emits `tracing` events. Enable the `logging`
//! feature to get a ready-made fmt subscriber:
//!
//! ```toml
//! tool-catalog = { version = "0.3", features = ["logging"] }
//! ```
//!
//! ```rust,ignore
//! use tool_catalog::observability::{LoggingConfig, TracingLevel, init_logging};
//!
//! init_logging(&LoggingConfig::new().level(TracingLevel::Debug))?;
//! ```

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TracingLevel {
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl TracingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: TracingLevel,
    /// Prefer `RUST_LOG` over `level` when it is set.
    pub respect_env: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: TracingLevel::Info,
            respect_env: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    pub fn respect_env(mut self, respect: bool) -> Self {
        self.respect_env = respect;
        self
    }

    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Filter directive applied when `RUST_LOG` is absent or ignored.
    pub fn directive(&self) -> String {
        format!("{}={}", env!("CARGO_CRATE_NAME"), self.level.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging initialization failed: {0}")]
    Init(String),
}

/// Install a global fmt subscriber. Fails if one is already installed.
#[cfg(feature = "logging")]
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fallback = || EnvFilter::new(config.directive());
    let env_filter = if config.respect_env {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_thread_ids(false)
        .with_file(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive() {
        let config = LoggingConfig::new().level(TracingLevel::Debug);
        assert_eq!(config.directive(), "tool_catalog=debug");
        assert!(config.respect_env);
    }

    #[cfg(feature = "logging")]
    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig::new().respect_env(false);
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
