//! Tracing initialization for hosts embedding the editor

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for tracing initialization
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Include the event target (module path)
    pub with_target: bool,
    /// Colorize console output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            with_target: true,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }
}

/// Install a console subscriber
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the existing one stays in place.
pub fn init_tracing(config: &TelemetryConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = fmt::layer()
        .with_target(config.with_target)
        .with_ansi(config.ansi);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
