//! Dashboard refresh orchestration
//!
//! One refresh cycle fans out four reads, tolerates the loss of the optional
//! ones, then derives the time-series view from a second, wider events read.
//! The summary read and the series read deliberately use different windows:
//! headline counters describe the last 24 hours, the chart describes whatever
//! range the operator selected.

use crate::aggregate::{self, TimeRange, TimeSeries};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use trapwatch_client::{AdminApiClient, EventFilter};
use trapwatch_core::config::RefreshConfig;
use trapwatch_core::{
    AnalyticsSnapshot, Ban, Error, EventsSummary, MazeSnapshot, Result, ServiceConfig,
};

/// Everything one successful refresh cycle produced
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    /// Analytics read model
    pub analytics: AnalyticsSnapshot,
    /// Headline events summary (24 h window)
    pub summary: EventsSummary,
    /// Current ban records
    pub bans: Vec<Ban>,
    /// Crawler-trap read model; `None` when the optional read failed
    pub maze: Option<MazeSnapshot>,
    /// Bucketed series for the selected range; `None` when the series read failed
    pub series: Option<TimeSeries>,
    /// Service configuration; `None` when the best-effort read failed
    pub config: Option<ServiceConfig>,
    /// When the cycle's data was assembled
    pub fetched_at: DateTime<Utc>,
}

/// Fetch events at the series limit and aggregate them for `range`
///
/// # Errors
///
/// Returns an error if the events read fails; the caller decides whether that
/// is fatal (range change keeps the stale chart) or part of a larger cycle.
pub async fn fetch_series(
    client: &AdminApiClient,
    range: TimeRange,
    config: &RefreshConfig,
) -> Result<TimeSeries> {
    let summary = client
        .get_events(EventFilter::Limit(config.series_event_limit))
        .await?;
    Ok(aggregate::aggregate(
        &summary.recent_events,
        range,
        Utc::now(),
    ))
}

/// Run one full refresh cycle.
///
/// Analytics, the events summary, and the bans listing are required: if any of
/// them fails the cycle fails with [`Error::PartialData`] and nothing should
/// be rendered from it. The maze read is optional and its failure is only
/// logged. The series and config reads run after the required three and are
/// likewise best-effort.
///
/// # Errors
///
/// Returns [`Error::PartialData`] naming the required sources that failed.
pub async fn fetch_dashboard(
    client: &AdminApiClient,
    range: TimeRange,
    config: &RefreshConfig,
) -> Result<DashboardSnapshot> {
    // Fan-out: all four reads are in flight at once, and we wait for every
    // result rather than aborting on the first failure, because the maze read
    // is allowed to fail on its own.
    let (analytics, summary, bans, maze) = tokio::join!(
        client.get_analytics(),
        client.get_events(EventFilter::Hours(config.summary_window_hours)),
        client.get_bans(),
        client.get_maze(),
    );

    let mut failed_sources = Vec::new();
    let mut first_failure: Option<Error> = None;

    let mut note_failure = |source: &str, error: Error| {
        failed_sources.push(source.to_string());
        if first_failure.is_none() {
            first_failure = Some(error);
        }
    };

    let analytics = match analytics {
        Ok(snapshot) => Some(snapshot),
        Err(error) => {
            note_failure("analytics", error);
            None
        }
    };
    let summary = match summary {
        Ok(summary) => Some(summary),
        Err(error) => {
            note_failure("events", error);
            None
        }
    };
    let bans = match bans {
        Ok(response) => Some(response.bans),
        Err(error) => {
            note_failure("bans", error);
            None
        }
    };

    if let (Some(analytics), Some(summary), Some(bans)) = (analytics, summary, bans) {
        let maze = match maze {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                warn!(error = %error, "maze read failed; leaving maze panel unchanged");
                None
            }
        };

        let series = match fetch_series(client, range, config).await {
            Ok(series) => Some(series),
            Err(error) => {
                warn!(error = %error, "series read failed; keeping previous chart");
                None
            }
        };

        let service_config = match client.get_config().await {
            Ok(service_config) => Some(service_config),
            Err(error) => {
                debug!(error = %error, "config read failed; editable fields not refreshed");
                None
            }
        };

        Ok(DashboardSnapshot {
            analytics,
            summary,
            bans,
            maze,
            series,
            config: service_config,
            fetched_at: Utc::now(),
        })
    } else {
        let detail = first_failure.map_or_else(String::new, |error| error.to_string());
        Err(Error::partial_data(failed_sources, detail))
    }
}
