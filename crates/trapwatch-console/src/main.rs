//! trapwatch — operator console for the bot trap mitigation service
//!
//! `trapwatch watch` runs the live dashboard loop; the other subcommands run
//! a single admin action and exit.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use trapwatch_client::AdminApiClient;
use trapwatch_console::{
    ActionExecutor, DashboardController, LogRenderer, RefreshScheduler, TimeRange,
};
use trapwatch_core::{BanDurations, ConsoleConfig, Error, Result};

/// Command line interface for the trapwatch console
#[derive(Parser)]
#[command(
    name = "trapwatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Operator console for the bot trap mitigation service",
    long_about = "Visualizes security events (bans, challenges, crawler-trap hits) from a \
                  bot trap service and issues administrative commands against its control API."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Control API endpoint (overrides configuration)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Admin API key (overrides configuration)
    #[arg(short, long, env = "TRAPWATCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Chart window selector for the CLI
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RangeArg {
    /// Last hour, 5-minute buckets
    Hour,
    /// Last 24 hours, 1-hour buckets
    Day,
    /// Last 7 days, 1-day buckets
    Week,
    /// Last 30 days, 1-day buckets
    Month,
}

impl From<RangeArg> for TimeRange {
    fn from(value: RangeArg) -> Self {
        match value {
            RangeArg::Hour => Self::Hour,
            RangeArg::Day => Self::Day,
            RangeArg::Week => Self::Week,
            RangeArg::Month => Self::Month,
        }
    }
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Run the live dashboard (default)
    Watch {
        /// Initial chart window
        #[arg(short, long, value_enum, default_value = "hour")]
        range: RangeArg,

        /// Periodic refresh interval in seconds (overrides configuration)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Ban an IP address
    Ban {
        /// IP address to ban
        ip: String,

        /// Ban reason
        #[arg(short, long)]
        reason: Option<String>,

        /// Ban duration in seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Remove the ban for an IP address
    Unban {
        /// IP address to unban
        ip: String,
    },

    /// Toggle log-only test mode
    TestMode {
        /// Desired state
        #[arg(value_enum)]
        state: ToggleArg,
    },

    /// Update the per-type ban durations (unset types keep their current value)
    Durations {
        /// Honeypot ban duration in seconds
        #[arg(long)]
        honeypot: Option<u64>,

        /// Rate-limit ban duration in seconds
        #[arg(long)]
        rate_limit: Option<u64>,

        /// Browser-check ban duration in seconds
        #[arg(long)]
        browser: Option<u64>,

        /// Manual admin ban duration in seconds
        #[arg(long)]
        admin: Option<u64>,
    },

    /// Update the crawler-trap maze controls (unset flags keep their current value)
    Maze {
        /// Enable or disable the maze
        #[arg(long)]
        enabled: Option<bool>,

        /// Enable or disable auto-banning trapped crawlers
        #[arg(long)]
        auto_ban: Option<bool>,

        /// Maze page hits before an auto-ban
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Show the current service configuration
    Config,
}

/// On/off argument for toggle commands
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ToggleArg {
    /// Turn the setting on
    On,
    /// Turn the setting off
    Off,
}

impl ToggleArg {
    const fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Main entry point for the console
///
/// # Errors
///
/// Returns an error if configuration loading fails or the requested action
/// fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if it exists (for development convenience)
    if let Err(e) = dotenvy::dotenv() {
        // It's okay if .env doesn't exist
        eprintln!("Note: .env file not loaded: {e}");
    }

    let cli = Cli::parse();

    trapwatch_core::init_logging(&cli.log_level, cli.json)?;

    let config = load_config(&cli)?;
    config.validate()?;

    let client = AdminApiClient::new(config.connection.clone());
    let renderer = Arc::new(LogRenderer::new());

    match cli.command {
        Some(Commands::Watch { range, interval }) => {
            watch(&config, client, renderer, range.into(), interval).await;
            Ok(())
        }
        Some(Commands::Ban {
            ip,
            reason,
            duration,
        }) => {
            let executor = one_shot_executor(&config, client, renderer);
            executor.ban(&ip, reason.as_deref(), duration).await?;
            Ok(())
        }
        Some(Commands::Unban { ip }) => {
            let executor = one_shot_executor(&config, client, renderer);
            executor.unban(&ip).await?;
            Ok(())
        }
        Some(Commands::TestMode { state }) => {
            let previous = client.get_config().await?.test_mode;
            let executor = one_shot_executor(&config, client, renderer);
            executor.set_test_mode(state.enabled(), previous).await?;
            Ok(())
        }
        Some(Commands::Durations {
            honeypot,
            rate_limit,
            browser,
            admin,
        }) => {
            // Overlay the provided values on the current configuration so the
            // patch always carries a complete durations block.
            let current = client.get_config().await?.ban_durations;
            let durations = BanDurations {
                honeypot: honeypot.unwrap_or(current.honeypot),
                rate_limit: rate_limit.unwrap_or(current.rate_limit),
                browser: browser.unwrap_or(current.browser),
                admin: admin.unwrap_or(current.admin),
            };
            let executor = one_shot_executor(&config, client, renderer);
            executor.save_ban_durations(durations).await?;
            Ok(())
        }
        Some(Commands::Maze {
            enabled,
            auto_ban,
            threshold,
        }) => {
            let current = client.get_config().await?;
            let executor = one_shot_executor(&config, client, renderer);
            executor
                .save_maze_config(
                    enabled.unwrap_or(current.maze_enabled),
                    auto_ban.unwrap_or(current.maze_auto_ban),
                    threshold.unwrap_or(current.maze_auto_ban_threshold),
                )
                .await?;
            Ok(())
        }
        Some(Commands::Config) => {
            use trapwatch_console::Renderer as _;
            let service_config = client.get_config().await?;
            renderer.render_config(&service_config);
            Ok(())
        }
        None => {
            // Default: run the dashboard with configuration defaults.
            watch(&config, client, renderer, TimeRange::Hour, None).await;
            Ok(())
        }
    }
}

/// Load configuration from an explicit file, or from the default sources
fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = if let Some(path) = &cli.config {
        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config file: {e}")))?
    } else {
        ConsoleConfig::load()?
    };

    if let Some(endpoint) = &cli.endpoint {
        config.connection.endpoint.clone_from(endpoint);
    }
    if let Some(api_key) = &cli.api_key {
        config.connection.api_key.clone_from(api_key);
    }

    Ok(config)
}

/// Run the live dashboard until Ctrl+C
async fn watch(
    config: &ConsoleConfig,
    client: AdminApiClient,
    renderer: Arc<LogRenderer>,
    range: TimeRange,
    interval_override: Option<u64>,
) {
    let interval = interval_override.map_or_else(
        || config.refresh.interval(),
        std::time::Duration::from_secs,
    );

    info!(
        endpoint = config.connection.base_url(),
        interval_seconds = interval.as_secs(),
        range = %range,
        "Starting dashboard"
    );

    let mut controller =
        DashboardController::new(client, renderer, config.refresh.clone(), range);
    let (scheduler, handle) = RefreshScheduler::new(interval);

    // The handle keeps the trigger channel open for the lifetime of the loop;
    // an interactive front-end would clone it for its buttons.
    let _handle = handle;

    tokio::select! {
        () = scheduler.run(&mut controller) => {}
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }
}

/// Build an executor whose post-action refresh has nowhere to land; one-shot
/// commands exit before the delay elapses
fn one_shot_executor(
    config: &ConsoleConfig,
    client: AdminApiClient,
    renderer: Arc<LogRenderer>,
) -> ActionExecutor<LogRenderer> {
    let (_scheduler, handle) = RefreshScheduler::new(config.refresh.interval());
    ActionExecutor::new(
        client,
        renderer,
        handle,
        config.actions.clone(),
        config.refresh.post_action_delay(),
    )
}
