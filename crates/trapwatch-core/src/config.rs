//! Configuration management for the trapwatch console

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for the operator console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Control API connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Refresh cadence settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Admin action defaults
    #[serde(default)]
    pub actions: ActionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Control API connection settings.
///
/// Endpoint and API key are operator-supplied and read fresh on every request
/// (see [`crate::config::ConnectionConfig::base_url`]); nothing here is cached
/// inside the request layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the bot trap control API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token for the admin API
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ConnectionConfig {
    /// Endpoint with any trailing slash trimmed, ready for path concatenation
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Get request timeout as Duration
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Refresh cadence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Periodic refresh interval in seconds
    #[serde(default = "default_refresh_interval")]
    pub interval_seconds: u64,

    /// Delay between a successful admin action and the follow-up refresh,
    /// in milliseconds; gives server-side state time to settle
    #[serde(default = "default_post_action_delay")]
    pub post_action_delay_ms: u64,

    /// Window of the headline events summary, in hours
    #[serde(default = "default_summary_window_hours")]
    pub summary_window_hours: u32,

    /// Event limit for the time-series read
    #[serde(default = "default_series_event_limit")]
    pub series_event_limit: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval(),
            post_action_delay_ms: default_post_action_delay(),
            summary_window_hours: default_summary_window_hours(),
            series_event_limit: default_series_event_limit(),
        }
    }
}

impl RefreshConfig {
    /// Get periodic refresh interval as Duration
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Get post-action refresh delay as Duration
    #[must_use]
    pub const fn post_action_delay(&self) -> Duration {
        Duration::from_millis(self.post_action_delay_ms)
    }
}

/// Admin action defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Reason attached to interactive bans when none is given
    #[serde(default = "default_ban_reason")]
    pub default_ban_reason: String,

    /// Duration attached to interactive bans when none is given, in seconds
    #[serde(default = "default_ban_duration")]
    pub default_ban_duration_seconds: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            default_ban_reason: default_ban_reason(),
            default_ban_duration_seconds: default_ban_duration(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_endpoint() -> String {
    "http://127.0.0.1:3000".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_refresh_interval() -> u64 {
    30
}

const fn default_post_action_delay() -> u64 {
    500
}

const fn default_summary_window_hours() -> u32 {
    24
}

const fn default_series_event_limit() -> u32 {
    1000
}

fn default_ban_reason() -> String {
    "manual_ban".to_string()
}

const fn default_ban_duration() -> u64 {
    21_600 // 6 hours
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl ConsoleConfig {
    /// Load configuration from files and environment
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if:
    /// - Configuration files contain invalid TOML syntax
    /// - Configuration values are of the wrong type
    /// - Environment variables have invalid values
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("trapwatch").required(false))
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("TRAPWATCH").separator("_"))
            .build()
            .map_err(|e| crate::Error::configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| crate::Error::configuration(e.to_string()))
    }

    /// Validate that the connection settings are usable
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if the endpoint or API key is
    /// empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.connection.base_url().is_empty() {
            return Err(crate::Error::configuration("endpoint must not be empty"));
        }
        if self.connection.api_key.is_empty() {
            return Err(crate::Error::configuration("api_key must not be empty"));
        }
        Ok(())
    }
}
