//! Core types and utilities for the trapwatch operator console

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ConnectionConfig, ConsoleConfig};
pub use error::{Error, Result};
pub use types::{
    AnalyticsSnapshot, Ban, BanDurations, BansResponse, ConfigPatch, CrawlerHits, Event,
    EventKind, EventsSummary, MazeSnapshot, MessageClass, ServiceConfig, UpdateConfigResponse,
};

/// Initialize the logging system
///
/// # Errors
///
/// Returns [`Error::Configuration`] if a global subscriber is already set.
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
    };

    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {e}")))
}
