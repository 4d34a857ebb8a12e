//! Operator console for the bot trap mitigation service
//!
//! The console visualizes security events (bans, challenges, crawler-trap
//! hits) and issues administrative commands against the service's control
//! API. Its core is the refresh and aggregation pipeline: parallel reads are
//! orchestrated into one consistent view, the raw event log is bucketed into
//! gap-free time series, and admin mutations run with optimistic feedback and
//! rollback. Presentation is a trait seam; the crate ships only a plain
//! terminal renderer.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod actions;
pub mod aggregate;
pub mod controller;
pub mod refresh;
pub mod render;
pub mod scheduler;

// Re-export commonly used types
pub use actions::ActionExecutor;
pub use aggregate::{TimeRange, TimeSeries, aggregate};
pub use controller::{DashboardController, DashboardViewState};
pub use refresh::{DashboardSnapshot, fetch_dashboard, fetch_series};
pub use render::{BanRow, HeadlineStats, InputField, LogRenderer, Renderer};
pub use scheduler::{RefreshHandle, RefreshScheduler, RefreshTrigger};
