//! Logging setup.
//!
//! Verbosity is carried in a [`LogSettings`] value handed to whatever needs
//! it (the subscriber at startup and the [`Converter`](crate::Converter) for
//! per-file progress lines) instead of living in a global flag.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logging configuration for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSettings {
    /// Log every written file and debug detail.
    pub verbose: bool,
}

impl LogSettings {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// The filter used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Builds the level filter, letting `RUST_LOG` override the default.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }

    /// Installs a console subscriber.
    ///
    /// Returns false if a global subscriber was already installed, in which
    /// case the existing one stays in place.
    pub fn init(&self) -> bool {
        let console = tracing_subscriber::fmt::layer()
            .with_target(self.verbose)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(console)
            .try_init()
            .is_ok()
    }
}
