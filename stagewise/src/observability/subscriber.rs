//! Subscriber setup for binaries, benches and tests.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Environment variable consulted by [`TracingConfig::from_env`].
pub const FILTER_ENV: &str = "RUST_LOG";

/// Configuration for the global `tracing` subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Filter directives, e.g. `stagewise=debug,info`.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
    /// Route output through the test harness capture.
    #[serde(default)]
    pub test_writer: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            test_writer: false,
        }
    }
}

impl TracingConfig {
    /// Creates a config with the given filter directives.
    #[must_use]
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }

    /// Reads filter directives from `RUST_LOG`, falling back to `info`.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(FILTER_ENV).map_or_else(|_| Self::default(), Self::new)
    }

    /// Config suited to unit tests: debug output captured per test.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            filter: "stagewise=debug".to_string(),
            json: false,
            test_writer: true,
        }
    }

    /// Switches to JSON output.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Builds the env filter from the directives.
    ///
    /// # Errors
    ///
    /// Returns an error if the directives do not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        EnvFilter::try_new(&self.filter)
    }

    /// Installs the global subscriber.
    ///
    /// Returns `Ok(false)` if a global subscriber was already installed,
    /// which makes repeated calls from tests harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter directives do not parse.
    pub fn try_init(&self) -> Result<bool, tracing_subscriber::filter::ParseError> {
        let filter = self.env_filter()?;
        let builder = tracing_subscriber::fmt().with_env_filter(filter);

        let installed = match (self.json, self.test_writer) {
            (true, true) => builder.json().with_test_writer().try_init().is_ok(),
            (true, false) => builder.json().try_init().is_ok(),
            (false, true) => builder.with_test_writer().try_init().is_ok(),
            (false, false) => builder.try_init().is_ok(),
        };

        Ok(installed)
    }
}
