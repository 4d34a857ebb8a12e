//! Dashboard controller: view state and guarded application of refresh results
//!
//! All chart/table handles live behind the controller's [`Renderer`]; there is
//! no module-level mutable state. Overlapping refresh cycles are disciplined
//! with a monotonically increasing sequence token: only the completion of the
//! most recently started cycle may touch the renderer.

use crate::aggregate::{TimeRange, TimeSeries};
use crate::refresh::{self, DashboardSnapshot};
use crate::render::{BanRow, HeadlineStats, Renderer};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, warn};
use trapwatch_client::AdminApiClient;
use trapwatch_core::config::RefreshConfig;
use trapwatch_core::Result;

/// Process-wide view state; rebuilt from the server on every refresh
#[derive(Debug, Clone)]
pub struct DashboardViewState {
    /// Currently selected chart window
    pub time_range: TimeRange,
    /// Last successfully rendered series
    pub last_series: Option<TimeSeries>,
    /// Whether a refresh cycle is currently in flight
    pub refresh_in_progress: bool,
    /// Last server-confirmed test-mode value, the rollback target for toggles
    pub test_mode: bool,
}

/// Owns the renderer, the client, and the refresh discipline
pub struct DashboardController<R> {
    client: AdminApiClient,
    renderer: Arc<R>,
    refresh_config: RefreshConfig,
    state: DashboardViewState,
    refresh_seq: u64,
}

impl<R> std::fmt::Debug for DashboardController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardController")
            .field("state", &self.state)
            .field("refresh_seq", &self.refresh_seq)
            .finish_non_exhaustive()
    }
}

impl<R: Renderer> DashboardController<R> {
    /// Create a new controller
    #[must_use]
    pub fn new(
        client: AdminApiClient,
        renderer: Arc<R>,
        refresh_config: RefreshConfig,
        initial_range: TimeRange,
    ) -> Self {
        Self {
            client,
            renderer,
            refresh_config,
            state: DashboardViewState {
                time_range: initial_range,
                last_series: None,
                refresh_in_progress: false,
                test_mode: false,
            },
            refresh_seq: 0,
        }
    }

    /// Current view state
    #[must_use]
    pub const fn state(&self) -> &DashboardViewState {
        &self.state
    }

    /// The shared renderer
    #[must_use]
    pub fn renderer(&self) -> Arc<R> {
        Arc::clone(&self.renderer)
    }

    /// The underlying API client
    #[must_use]
    pub const fn client(&self) -> &AdminApiClient {
        &self.client
    }

    /// Start a new refresh cycle and return its sequence token.
    ///
    /// Starting a cycle invalidates every earlier token: completions carrying
    /// one are dropped by [`Self::finish_cycle`].
    pub fn begin_cycle(&mut self) -> u64 {
        self.refresh_seq += 1;
        self.state.refresh_in_progress = true;
        self.refresh_seq
    }

    /// Apply the outcome of a refresh cycle, unless a newer cycle has started
    pub fn finish_cycle(&mut self, token: u64, result: Result<DashboardSnapshot>) {
        if token != self.refresh_seq {
            debug!(
                token,
                current = self.refresh_seq,
                "dropping stale refresh completion"
            );
            return;
        }
        self.state.refresh_in_progress = false;

        match result {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(err) => {
                error!(error = %err, "dashboard refresh failed");
                // Prior rendered state stays in place; only the banner changes.
                self.renderer.set_refresh_error(Utc::now(), &err.to_string());
            }
        }
    }

    /// Run one full refresh cycle against the API
    pub async fn refresh(&mut self) {
        let token = self.begin_cycle();
        let result =
            refresh::fetch_dashboard(&self.client, self.state.time_range, &self.refresh_config)
                .await;
        self.finish_cycle(token, result);
    }

    /// Switch the chart window and re-derive only the time-series view.
    ///
    /// A failed series read keeps the previous chart; the rest of the
    /// dashboard is untouched either way.
    pub async fn change_time_range(&mut self, range: TimeRange) {
        self.state.time_range = range;
        let token = self.begin_cycle();
        let result = refresh::fetch_series(&self.client, range, &self.refresh_config).await;

        if token != self.refresh_seq {
            debug!(token, "dropping stale series completion");
            return;
        }
        self.state.refresh_in_progress = false;

        match result {
            Ok(series) => {
                self.renderer.render_time_series(range, &series);
                self.state.last_series = Some(series);
            }
            Err(err) => {
                warn!(error = %err, "series refresh failed; keeping previous chart");
            }
        }
    }

    /// Hand one snapshot's finished data structures to the renderer
    fn apply_snapshot(&mut self, snapshot: DashboardSnapshot) {
        let stats = HeadlineStats {
            ban_count: snapshot.analytics.ban_count,
            active_bans: snapshot.bans.len(),
            recent_events: snapshot.summary.recent_events.len(),
            unique_ips: snapshot.summary.top_ips.len(),
            test_mode: snapshot.analytics.test_mode,
        };
        self.state.test_mode = stats.test_mode;
        self.renderer.render_stats(&stats);
        self.renderer.set_test_mode(stats.test_mode);

        // HashMap iteration order is unstable; sort for a stable display.
        let mut kind_counts: Vec<(String, u64)> =
            snapshot.summary.event_counts.iter().map(|(kind, &count)| (kind.clone(), count)).collect();
        kind_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        self.renderer.render_event_kinds(&kind_counts);

        self.renderer.render_top_ips(&snapshot.summary.top_ips);

        if let Some(series) = snapshot.series {
            self.renderer
                .render_time_series(self.state.time_range, &series);
            self.state.last_series = Some(series);
        }

        let now_s = u64::try_from(snapshot.fetched_at.timestamp()).unwrap_or(0);
        let rows: Vec<BanRow> = snapshot
            .bans
            .iter()
            .map(|ban| BanRow {
                ip: ban.ip.clone(),
                reason: ban
                    .reason
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                expires: ban.expires,
                expired: ban.is_expired(now_s),
            })
            .collect();
        self.renderer.render_bans(&rows);

        self.renderer.render_events(&snapshot.summary.recent_events);

        if let Some(maze) = &snapshot.maze {
            self.renderer.render_maze(maze);
        }
        if let Some(config) = &snapshot.config {
            self.renderer.render_config(config);
        }

        self.renderer.set_last_updated(snapshot.fetched_at);
    }
}
