//! Admin actions with optimistic feedback and rollback
//!
//! Every action follows the same protocol: validate locally, announce the
//! attempt, issue exactly one mutating call, then either confirm and schedule
//! a delayed refresh or report the failure. Toggle-style controls are
//! reverted on failure so they never show a state the server did not confirm.

use crate::render::{InputField, Renderer};
use crate::scheduler::RefreshHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use trapwatch_client::AdminApiClient;
use trapwatch_core::config::ActionConfig;
use trapwatch_core::{BanDurations, ConfigPatch, Error, MessageClass, Result};

/// Issues administrative mutations against the control API
pub struct ActionExecutor<R> {
    client: AdminApiClient,
    renderer: Arc<R>,
    refresher: RefreshHandle,
    defaults: ActionConfig,
    post_action_delay: Duration,
}

impl<R> std::fmt::Debug for ActionExecutor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("defaults", &self.defaults)
            .field("post_action_delay", &self.post_action_delay)
            .finish_non_exhaustive()
    }
}

/// Failure text shown to the operator: status and raw body for API errors,
/// the display form otherwise
fn failure_detail(error: &Error) -> String {
    match error {
        Error::Api { status, body } => format!("{status} {body}"),
        other => other.to_string(),
    }
}

impl<R: Renderer> ActionExecutor<R> {
    /// Create a new executor
    #[must_use]
    pub fn new(
        client: AdminApiClient,
        renderer: Arc<R>,
        refresher: RefreshHandle,
        defaults: ActionConfig,
        post_action_delay: Duration,
    ) -> Self {
        Self {
            client,
            renderer,
            refresher,
            defaults,
            post_action_delay,
        }
    }

    /// Ban an IP; empty `reason`/`duration` fall back to the configured
    /// defaults
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty IP (no network call is
    /// made), or the API/network failure otherwise.
    pub async fn ban(
        &self,
        ip: &str,
        reason: Option<&str>,
        duration_seconds: Option<u64>,
    ) -> Result<()> {
        let ip = ip.trim();
        if ip.is_empty() {
            self.renderer
                .show_message(MessageClass::Warning, "Enter an IP to ban.");
            return Err(Error::validation("ip", "IP must not be empty"));
        }

        let reason = reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(&self.defaults.default_ban_reason);
        let duration = duration_seconds.unwrap_or(self.defaults.default_ban_duration_seconds);

        self.renderer
            .show_message(MessageClass::Info, &format!("Banning {ip}..."));

        match self.client.ban(ip, reason, duration).await {
            Ok(_) => {
                info!(ip, reason, duration, "ban issued");
                self.renderer.show_message(
                    MessageClass::Success,
                    &format!("Banned {ip} for {duration}s"),
                );
                self.renderer.clear_input(InputField::BanIp);
                self.refresher.refresh_after(self.post_action_delay);
                Ok(())
            }
            Err(err) => {
                self.renderer.show_message(
                    MessageClass::Error,
                    &format!("Ban failed: {}", failure_detail(&err)),
                );
                Err(err)
            }
        }
    }

    /// Remove the ban for an IP
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty IP (no network call is
    /// made), or the API/network failure otherwise.
    pub async fn unban(&self, ip: &str) -> Result<()> {
        let ip = ip.trim();
        if ip.is_empty() {
            self.renderer
                .show_message(MessageClass::Warning, "Enter an IP to unban.");
            return Err(Error::validation("ip", "IP must not be empty"));
        }

        self.renderer
            .show_message(MessageClass::Info, &format!("Unbanning {ip}..."));

        match self.client.unban(ip).await {
            Ok(_) => {
                info!(ip, "unban issued");
                self.renderer
                    .show_message(MessageClass::Success, &format!("Unbanned {ip}"));
                self.renderer.clear_input(InputField::UnbanIp);
                self.refresher.refresh_after(self.post_action_delay);
                Ok(())
            }
            Err(err) => {
                self.renderer.show_message(
                    MessageClass::Error,
                    &format!("Unban failed: {}", failure_detail(&err)),
                );
                Err(err)
            }
        }
    }

    /// Toggle log-only test mode.
    ///
    /// `previous` is the last server-confirmed value; on failure the control
    /// is reverted to it.
    ///
    /// # Errors
    ///
    /// Returns the API/network failure when the update is rejected.
    pub async fn set_test_mode(&self, enabled: bool, previous: bool) -> Result<()> {
        let verb = if enabled { "Enabling" } else { "Disabling" };
        self.renderer
            .show_message(MessageClass::Info, &format!("{verb} test mode..."));

        match self.client.update_config(&ConfigPatch::test_mode(enabled)).await {
            Ok(response) => {
                let confirmed = response.config.test_mode;
                info!(test_mode = confirmed, "test mode updated");
                self.renderer.set_test_mode(confirmed);
                self.renderer.show_message(
                    MessageClass::Success,
                    &format!(
                        "Test mode {}",
                        if confirmed { "enabled" } else { "disabled" }
                    ),
                );
                self.refresher.refresh_after(self.post_action_delay);
                Ok(())
            }
            Err(err) => {
                // Never leave the toggle showing an unconfirmed state.
                self.renderer.set_test_mode(previous);
                self.renderer.show_message(
                    MessageClass::Error,
                    &format!("Test mode update failed: {}", failure_detail(&err)),
                );
                Err(err)
            }
        }
    }

    /// Save the per-type ban durations
    ///
    /// # Errors
    ///
    /// Returns the API/network failure when the update is rejected.
    pub async fn save_ban_durations(&self, durations: BanDurations) -> Result<()> {
        self.renderer
            .show_message(MessageClass::Info, "Saving ban durations...");

        match self
            .client
            .update_config(&ConfigPatch::ban_durations(durations))
            .await
        {
            Ok(_) => {
                self.renderer
                    .show_message(MessageClass::Success, "Ban durations saved");
                self.refresher.refresh_after(self.post_action_delay);
                Ok(())
            }
            Err(err) => {
                self.renderer.show_message(
                    MessageClass::Error,
                    &format!("Config update failed: {}", failure_detail(&err)),
                );
                Err(err)
            }
        }
    }

    /// Save the maze controls
    ///
    /// # Errors
    ///
    /// Returns the API/network failure when the update is rejected.
    pub async fn save_maze_config(
        &self,
        enabled: bool,
        auto_ban: bool,
        threshold: u32,
    ) -> Result<()> {
        self.renderer
            .show_message(MessageClass::Info, "Saving maze config...");

        match self
            .client
            .update_config(&ConfigPatch::maze(enabled, auto_ban, threshold))
            .await
        {
            Ok(_) => {
                self.renderer
                    .show_message(MessageClass::Success, "Maze config saved");
                self.refresher.refresh_after(self.post_action_delay);
                Ok(())
            }
            Err(err) => {
                self.renderer.show_message(
                    MessageClass::Error,
                    &format!("Config update failed: {}", failure_detail(&err)),
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::render::testing::RecordingRenderer;
    use crate::scheduler::{RefreshScheduler, RefreshTrigger};
    use pretty_assertions::assert_eq;
    use trapwatch_core::ConnectionConfig;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        executor: ActionExecutor<RecordingRenderer>,
        renderer: Arc<RecordingRenderer>,
        scheduler: RefreshScheduler,
    }

    fn fixture(endpoint: String) -> Fixture {
        let renderer = Arc::new(RecordingRenderer::default());
        let client = AdminApiClient::new(ConnectionConfig {
            endpoint,
            api_key: "test-key".to_string(),
            request_timeout_seconds: 1,
        });
        let (scheduler, handle) = RefreshScheduler::new(Duration::from_secs(30));
        let executor = ActionExecutor::new(
            client,
            Arc::clone(&renderer),
            handle,
            ActionConfig::default(),
            Duration::from_millis(500),
        );
        Fixture {
            executor,
            renderer,
            scheduler,
        }
    }

    async fn expect_post_action(scheduler: &mut RefreshScheduler) {
        let trigger = tokio::time::timeout(Duration::from_secs(2), scheduler.next_trigger())
            .await
            .unwrap();
        assert_eq!(trigger, Some(RefreshTrigger::PostAction));
    }

    #[tokio::test]
    async fn test_ban_success_message_and_delayed_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/ban"))
            .and(body_json(serde_json::json!({
                "ip": "1.2.3.4",
                "reason": "manual_ban",
                "duration": 3600,
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "banned", "ip": "1.2.3.4"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut fixture = fixture(server.uri());
        fixture
            .executor
            .ban("1.2.3.4", Some("manual_ban"), Some(3600))
            .await
            .unwrap();

        let successes = fixture.renderer.messages_of(MessageClass::Success);
        assert_eq!(successes.len(), 1);
        assert!(successes[0].contains("1.2.3.4"));
        assert!(successes[0].contains("3600"));
        assert_eq!(
            fixture.renderer.messages_of(MessageClass::Info),
            vec!["Banning 1.2.3.4...".to_string()]
        );
        assert_eq!(fixture.renderer.cleared.lock().as_slice(), &[InputField::BanIp]);

        // The refresh lands ~500 ms later.
        expect_post_action(&mut fixture.scheduler).await;
    }

    #[tokio::test]
    async fn test_ban_defaults_applied() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/ban"))
            .and(body_json(serde_json::json!({
                "ip": "1.2.3.4",
                "reason": "manual_ban",
                "duration": 21_600,
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "banned"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fixture = fixture(server.uri());
        fixture.executor.ban("1.2.3.4", None, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_ip_is_rejected_locally() {
        let server = MockServer::start().await;
        // No mocks mounted: any request would 404 and the expect below would
        // not hold, so reaching the network at all fails the test.
        Mock::given(method("POST"))
            .and(path("/admin/ban"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fixture = fixture(server.uri());
        let error = fixture.executor.ban("   ", None, None).await.unwrap_err();
        assert!(error.is_validation());
        assert_eq!(
            fixture.renderer.messages_of(MessageClass::Warning),
            vec!["Enter an IP to ban.".to_string()]
        );
        assert!(fixture.renderer.messages_of(MessageClass::Info).is_empty());
    }

    #[tokio::test]
    async fn test_unban_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/unban"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Unbanned"))
            .expect(1)
            .mount(&server)
            .await;

        let mut fixture = fixture(server.uri());
        fixture.executor.unban("1.2.3.4").await.unwrap();

        assert_eq!(
            fixture.renderer.messages_of(MessageClass::Success),
            vec!["Unbanned 1.2.3.4".to_string()]
        );
        assert_eq!(
            fixture.renderer.cleared.lock().as_slice(),
            &[InputField::UnbanIp]
        );
        expect_post_action(&mut fixture.scheduler).await;
    }

    #[tokio::test]
    async fn test_unban_empty_ip_rejected() {
        let fixture = fixture("http://192.0.2.1:9".to_string());
        let error = fixture.executor.unban("").await.unwrap_err();
        assert!(error.is_validation());
        assert_eq!(
            fixture.renderer.messages_of(MessageClass::Warning),
            vec!["Enter an IP to unban.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_ban_failure_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/ban"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Missing 'ip' field"))
            .mount(&server)
            .await;

        let fixture = fixture(server.uri());
        let error = fixture
            .executor
            .ban("1.2.3.4", None, None)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Api { status: 400, .. }));

        let errors = fixture.renderer.messages_of(MessageClass::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Ban failed:"));
        assert!(errors[0].contains("400"));
        assert!(errors[0].contains("Missing 'ip' field"));
        // No input cleared, no refresh scheduled.
        assert!(fixture.renderer.cleared.lock().is_empty());
    }

    #[tokio::test]
    async fn test_test_mode_toggle_confirms_server_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/config"))
            .and(body_json(serde_json::json!({"test_mode": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "updated",
                "config": {"test_mode": true},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut fixture = fixture(server.uri());
        fixture.executor.set_test_mode(true, false).await.unwrap();

        assert_eq!(fixture.renderer.test_mode.lock().as_slice(), &[true]);
        assert_eq!(
            fixture.renderer.messages_of(MessageClass::Success),
            vec!["Test mode enabled".to_string()]
        );
        expect_post_action(&mut fixture.scheduler).await;
    }

    #[tokio::test]
    async fn test_failed_toggle_rolls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/config"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let fixture = fixture(server.uri());
        let error = fixture
            .executor
            .set_test_mode(true, false)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Api { status: 403, .. }));

        // The control reflects the pre-toggle value again.
        assert_eq!(fixture.renderer.test_mode.lock().as_slice(), &[false]);
        let errors = fixture.renderer.messages_of(MessageClass::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("403"));
    }

    #[tokio::test]
    async fn test_save_ban_durations_sends_block_patch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/config"))
            .and(body_json(serde_json::json!({
                "ban_durations": {
                    "honeypot": 86_400,
                    "rate_limit": 3_600,
                    "browser": 21_600,
                    "admin": 21_600,
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "updated",
                "config": {},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut fixture = fixture(server.uri());
        fixture
            .executor
            .save_ban_durations(BanDurations::default())
            .await
            .unwrap();

        assert_eq!(
            fixture.renderer.messages_of(MessageClass::Success),
            vec!["Ban durations saved".to_string()]
        );
        expect_post_action(&mut fixture.scheduler).await;
    }

    #[tokio::test]
    async fn test_save_maze_config_patches_only_maze_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/config"))
            .and(body_json(serde_json::json!({
                "maze_enabled": true,
                "maze_auto_ban": false,
                "maze_auto_ban_threshold": 30,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "updated",
                "config": {},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fixture = fixture(server.uri());
        fixture
            .executor
            .save_maze_config(true, false, 30)
            .await
            .unwrap();

        assert_eq!(
            fixture.renderer.messages_of(MessageClass::Success),
            vec!["Maze config saved".to_string()]
        );
    }
}
