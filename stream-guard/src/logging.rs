//! Logging utilities and configuration for stream-guard.
//!
//! The detector itself is silent; the driving loop decides what to emit based
//! on a [`LogConfig`]. Subscriber installation lives in [`setup`].

/// Controls which events the driving loop emits.
///
/// Per-sample events are the expensive ones at high tick rates, so they are
/// off unless explicitly requested.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to emit a debug event for every processed sample
    pub log_samples: bool,
    /// Whether to emit an info event for every confirmed anomaly
    pub log_anomalies: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_samples: false,
            log_anomalies: true,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            log_samples: true,
            log_anomalies: true,
        }
    }
}

/// Macro for per-sample debug logging.
///
/// Arguments are only evaluated when `log_samples` is enabled.
#[macro_export]
macro_rules! log_sample {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_samples {
            tracing::debug!($($arg)*);
        }
    };
}

/// Utilities for setting up structured logging.
pub mod setup {
    use tracing::Level;

    use crate::error::{GuardError, Result};

    /// Configuration for stream-guard's logging setup.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for stream-guard components specifically
        pub crate_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                crate_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},stream_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Initializes logging. `RUST_LOG` overrides the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use stream_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        // Logs go to stderr so stdout stays free for the rendered stream.
        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| GuardError::custom(format!("Failed to initialize logging: {e}")))
    }
}
