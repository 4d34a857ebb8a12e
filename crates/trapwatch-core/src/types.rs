//! Wire types for the bot trap control API and console read models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind tag for an entry in the service's security event log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An IP was banned (manually or by automatic policy)
    Ban,
    /// A ban was removed
    Unban,
    /// A visitor was served a challenge
    Challenge,
    /// A request was blocked outright
    Block,
    /// An administrative operation was performed
    AdminAction,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ban => write!(f, "Ban"),
            Self::Unban => write!(f, "Unban"),
            Self::Challenge => write!(f, "Challenge"),
            Self::Block => write!(f, "Block"),
            Self::AdminAction => write!(f, "AdminAction"),
        }
    }
}

/// A single entry from the service's append-only event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unix timestamp in seconds
    pub ts: u64,

    /// Event kind
    pub event: EventKind,

    /// Subject IP, when the event concerns one
    pub ip: Option<String>,

    /// Reason recorded by the service
    pub reason: Option<String>,

    /// Outcome recorded by the service
    pub outcome: Option<String>,

    /// Administrator who triggered the event, for admin-originated entries
    pub admin: Option<String>,
}

/// An active (or expired-but-not-yet-reaped) ban
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ban {
    /// Banned IP address
    pub ip: String,

    /// Reason the ban was created
    pub reason: Option<String>,

    /// Unix timestamp (seconds) at which the ban expires
    pub expires: u64,
}

impl Ban {
    /// Whether the ban has already expired relative to `now` (unix seconds).
    ///
    /// The server does not return the ban-start time, so expiry is the only
    /// lifecycle fact the console can derive.
    #[must_use]
    pub const fn is_expired(&self, now: u64) -> bool {
        self.expires < now
    }
}

/// Per-type ban durations, in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BanDurations {
    /// Accessing honeypot URLs
    pub honeypot: u64,

    /// Exceeding rate limits
    pub rate_limit: u64,

    /// Outdated or suspicious browser
    pub browser: u64,

    /// Manual admin ban
    pub admin: u64,
}

impl Default for BanDurations {
    fn default() -> Self {
        Self {
            honeypot: 86_400,
            rate_limit: 3_600,
            browser: 21_600,
            admin: 21_600,
        }
    }
}

/// The service's singleton configuration, as returned by `GET /admin/config`.
///
/// The service replies with more fields than the console edits; unknown keys
/// are ignored on decode and absent keys fall back to service defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Log-only mode: detections are recorded but nothing is blocked
    #[serde(default)]
    pub test_mode: bool,

    /// Per-type ban durations
    #[serde(default)]
    pub ban_durations: BanDurations,

    /// Whether the crawler-trap maze is enabled
    #[serde(default)]
    pub maze_enabled: bool,

    /// Whether crawlers are auto-banned after hitting the maze threshold
    #[serde(default = "default_maze_auto_ban")]
    pub maze_auto_ban: bool,

    /// Number of maze page hits that triggers an auto-ban
    #[serde(default = "default_maze_auto_ban_threshold")]
    pub maze_auto_ban_threshold: u32,
}

const fn default_maze_auto_ban() -> bool {
    true
}

const fn default_maze_auto_ban_threshold() -> u32 {
    50
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            ban_durations: BanDurations::default(),
            maze_enabled: false,
            maze_auto_ban: default_maze_auto_ban(),
            maze_auto_ban_threshold: default_maze_auto_ban_threshold(),
        }
    }
}

/// Partial update for [`ServiceConfig`].
///
/// Only populated keys are serialized; the server mutates exactly the supplied
/// keys and leaves the rest untouched, so the console never resends the full
/// configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigPatch {
    /// New test-mode value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_mode: Option<bool>,

    /// New per-type ban durations (sent as a whole block)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_durations: Option<BanDurations>,

    /// New maze-enabled value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maze_enabled: Option<bool>,

    /// New maze auto-ban value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maze_auto_ban: Option<bool>,

    /// New maze auto-ban threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maze_auto_ban_threshold: Option<u32>,
}

impl ConfigPatch {
    /// Patch that toggles test mode only
    #[must_use]
    pub fn test_mode(enabled: bool) -> Self {
        Self {
            test_mode: Some(enabled),
            ..Self::default()
        }
    }

    /// Patch that replaces the per-type ban durations only
    #[must_use]
    pub fn ban_durations(durations: BanDurations) -> Self {
        Self {
            ban_durations: Some(durations),
            ..Self::default()
        }
    }

    /// Patch that updates the maze controls only
    #[must_use]
    pub fn maze(enabled: bool, auto_ban: bool, threshold: u32) -> Self {
        Self {
            maze_enabled: Some(enabled),
            maze_auto_ban: Some(auto_ban),
            maze_auto_ban_threshold: Some(threshold),
            ..Self::default()
        }
    }
}

/// Response shape of `POST /admin/config`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConfigResponse {
    /// The configuration after the patch was applied
    pub config: ServiceConfig,
}

/// Point-in-time analytics read model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyticsSnapshot {
    /// Number of ban records currently held by the service
    pub ban_count: u64,

    /// Whether the service is in log-only test mode
    pub test_mode: bool,
}

/// Hit count for a single crawler trapped in the maze
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrawlerHits {
    /// Crawler IP
    pub ip: String,

    /// Maze pages served to this IP
    pub hits: u64,
}

/// Point-in-time crawler-trap read model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MazeSnapshot {
    /// Total maze pages served
    #[serde(default)]
    pub total_hits: u64,

    /// Number of distinct IPs that entered the maze
    #[serde(default)]
    pub unique_crawlers: u64,

    /// Bans issued automatically for maze abuse
    #[serde(default)]
    pub maze_auto_bans: u64,

    /// The crawler that went deepest into the maze
    #[serde(default)]
    pub deepest_crawler: Option<CrawlerHits>,

    /// Top crawlers by hit count, descending
    #[serde(default)]
    pub top_crawlers: Vec<CrawlerHits>,
}

/// Response shape of `GET /admin/events`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsSummary {
    /// Event counts keyed by kind name
    #[serde(default)]
    pub event_counts: HashMap<String, u64>,

    /// Most active IPs as `(ip, count)` pairs, descending
    #[serde(default)]
    pub top_ips: Vec<(String, u64)>,

    /// Most recent events, newest first
    #[serde(default)]
    pub recent_events: Vec<Event>,
}

/// Response shape of `GET /admin/ban`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BansResponse {
    /// All ban records the service currently holds
    #[serde(default)]
    pub bans: Vec<Ban>,
}

/// Severity class of an operator-facing status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// An action is in progress
    Info,
    /// An action completed
    Success,
    /// Local validation rejected the action
    Warning,
    /// An action or refresh failed
    Error,
}

impl MessageClass {
    /// Stable lowercase name, matching the service's message CSS classes
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for MessageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
