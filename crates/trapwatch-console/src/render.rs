//! The presentation seam
//!
//! The core hands finished data structures to a [`Renderer`]; everything about
//! layout, charting, and widget wiring lives behind this trait. The console
//! ships a plain terminal implementation; a richer front-end implements the
//! same trait.

use crate::aggregate::{TimeRange, TimeSeries};
use chrono::{DateTime, Utc};
use trapwatch_core::{Event, MazeSnapshot, MessageClass, ServiceConfig};

/// Transient input fields the executor may clear after a successful action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    /// The ban form's IP field
    BanIp,
    /// The unban form's IP field
    UnbanIp,
}

/// Headline counters shown at the top of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlineStats {
    /// Ban records held by the service
    pub ban_count: u64,
    /// Ban records in the current listing
    pub active_bans: usize,
    /// Events in the summary window
    pub recent_events: usize,
    /// Distinct IPs in the summary window
    pub unique_ips: usize,
    /// Whether the service is in log-only test mode
    pub test_mode: bool,
}

/// One row of the bans table.
///
/// The server does not report when a ban was created, so no banned-at value is
/// shown; deriving one from `expires` would only be right for one duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRow {
    /// Banned IP
    pub ip: String,
    /// Ban reason, `unknown` when the server omitted it
    pub reason: String,
    /// Expiry as unix seconds
    pub expires: u64,
    /// Whether the ban has already lapsed
    pub expired: bool,
}

/// Consumer of finished dashboard data structures.
///
/// Implementations are side-effect-only: they may draw, log, or update
/// widgets, but never compute or fetch. All methods take `&self` so a renderer
/// can be shared between the refresh pipeline and the action executor.
pub trait Renderer: Send + Sync {
    /// Update the headline counters
    fn render_stats(&self, stats: &HeadlineStats);

    /// Update the event-kind breakdown, descending by count
    fn render_event_kinds(&self, counts: &[(String, u64)]);

    /// Update the most-active-IPs listing, descending by count
    fn render_top_ips(&self, top_ips: &[(String, u64)]);

    /// Replace the time-series view
    fn render_time_series(&self, range: TimeRange, series: &TimeSeries);

    /// Replace the bans table
    fn render_bans(&self, bans: &[BanRow]);

    /// Replace the recent-events table
    fn render_events(&self, events: &[Event]);

    /// Update the crawler-trap panel
    fn render_maze(&self, maze: &MazeSnapshot);

    /// Populate editable configuration fields (durations, maze controls)
    fn render_config(&self, config: &ServiceConfig);

    /// Set the test-mode control to a server-confirmed value
    fn set_test_mode(&self, enabled: bool);

    /// Show an operator-facing status message
    fn show_message(&self, class: MessageClass, text: &str);

    /// Raise the timestamped refresh-failure banner; prior data stays visible
    fn set_refresh_error(&self, at: DateTime<Utc>, detail: &str);

    /// Stamp the last successful refresh time
    fn set_last_updated(&self, at: DateTime<Utc>);

    /// Clear a transient input field after a successful action
    fn clear_input(&self, field: InputField);
}

/// Plain terminal renderer used by the `trapwatch` binary.
///
/// Prints each section as indented lines; good enough for a terminal session
/// and for following a `watch` run through a pipe.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl LogRenderer {
    /// Create a new terminal renderer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[allow(clippy::print_stdout)]
impl Renderer for LogRenderer {
    fn render_stats(&self, stats: &HeadlineStats) {
        println!(
            "stats: bans={} listed={} events={} unique_ips={} test_mode={}",
            stats.ban_count, stats.active_bans, stats.recent_events, stats.unique_ips,
            stats.test_mode
        );
    }

    fn render_event_kinds(&self, counts: &[(String, u64)]) {
        println!("event kinds:");
        for (kind, count) in counts {
            println!("  {kind:<12} {count}");
        }
    }

    fn render_top_ips(&self, top_ips: &[(String, u64)]) {
        println!("top ips:");
        for (ip, count) in top_ips {
            println!("  {ip:<40} {count}");
        }
    }

    fn render_time_series(&self, range: TimeRange, series: &TimeSeries) {
        println!("events per bucket ({range}):");
        for (label, count) in series.labels.iter().zip(&series.counts) {
            println!("  {label:<18} {count}");
        }
    }

    fn render_bans(&self, bans: &[BanRow]) {
        if bans.is_empty() {
            println!("bans: none active");
            return;
        }
        println!("bans:");
        for ban in bans {
            let status = if ban.expired { "expired" } else { "active" };
            println!(
                "  {:<40} {:<16} expires={} ({status})",
                ban.ip, ban.reason, ban.expires
            );
        }
    }

    fn render_events(&self, events: &[Event]) {
        if events.is_empty() {
            println!("events: none in window");
            return;
        }
        println!("recent events:");
        for event in events {
            println!(
                "  ts={} {:<12} ip={} reason={} outcome={} admin={}",
                event.ts,
                event.event,
                event.ip.as_deref().unwrap_or("-"),
                event.reason.as_deref().unwrap_or("-"),
                event.outcome.as_deref().unwrap_or("-"),
                event.admin.as_deref().unwrap_or("-"),
            );
        }
    }

    fn render_maze(&self, maze: &MazeSnapshot) {
        println!(
            "maze: hits={} crawlers={} auto_bans={}",
            maze.total_hits, maze.unique_crawlers, maze.maze_auto_bans
        );
        for crawler in &maze.top_crawlers {
            println!("  {:<40} {} pages", crawler.ip, crawler.hits);
        }
    }

    fn render_config(&self, config: &ServiceConfig) {
        println!(
            "config: test_mode={} maze_enabled={} maze_auto_ban={} maze_threshold={}",
            config.test_mode, config.maze_enabled, config.maze_auto_ban,
            config.maze_auto_ban_threshold
        );
        println!(
            "  ban durations: honeypot={}s rate_limit={}s browser={}s admin={}s",
            config.ban_durations.honeypot,
            config.ban_durations.rate_limit,
            config.ban_durations.browser,
            config.ban_durations.admin
        );
    }

    fn set_test_mode(&self, enabled: bool) {
        println!("test mode control: {}", if enabled { "on" } else { "off" });
    }

    fn show_message(&self, class: MessageClass, text: &str) {
        println!("[{class}] {text}");
    }

    fn set_refresh_error(&self, at: DateTime<Utc>, detail: &str) {
        println!("refresh error at {}: {detail}", at.format("%H:%M:%S"));
    }

    fn set_last_updated(&self, at: DateTime<Utc>) {
        println!("last updated: {}", at.format("%H:%M:%S"));
    }

    fn clear_input(&self, _field: InputField) {}
}
