//! HTTP client for the bot trap admin API

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use trapwatch_core::{
    AnalyticsSnapshot, BansResponse, ConfigPatch, ConnectionConfig, Error, EventsSummary,
    MazeSnapshot, Result, ServiceConfig, UpdateConfigResponse,
};

/// Window selector for the events read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    /// Events from the last N hours
    Hours(u32),
    /// The most recent N events regardless of age
    Limit(u32),
}

impl EventFilter {
    fn query(self) -> String {
        match self {
            Self::Hours(hours) => format!("hours={hours}"),
            Self::Limit(limit) => format!("limit={limit}"),
        }
    }
}

/// Authenticated request layer for the bot trap control API.
///
/// Endpoint and API key are read fresh from the shared [`ConnectionConfig`] on
/// every request, so an operator changing them mid-session takes effect on the
/// next call. Every request carries `Authorization: Bearer <apikey>`; requests
/// with a body also carry `Content-Type: application/json`. Any non-2xx
/// response fails with [`Error::Api`] carrying both the status and the raw
/// body text. This layer performs no retries; retry policy belongs to callers.
#[derive(Debug, Clone)]
pub struct AdminApiClient {
    http: reqwest::Client,
    settings: Arc<RwLock<ConnectionConfig>>,
}

impl AdminApiClient {
    /// Create a new client owning its connection settings
    #[must_use]
    pub fn new(settings: ConnectionConfig) -> Self {
        Self::with_shared(Arc::new(RwLock::new(settings)))
    }

    /// Create a new client over connection settings shared with the caller
    #[must_use]
    pub fn with_shared(settings: Arc<RwLock<ConnectionConfig>>) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Handle to the shared connection settings
    #[must_use]
    pub fn settings(&self) -> Arc<RwLock<ConnectionConfig>> {
        Arc::clone(&self.settings)
    }

    /// Issue a request and return the raw response body text.
    ///
    /// Transport failures map to [`Error::Network`]; non-2xx responses map to
    /// [`Error::Api`] with the body text attached.
    async fn send(
        &self,
        method: reqwest::Method,
        path_and_query: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let (url, api_key, timeout) = {
            let settings = self.settings.read();
            (
                format!("{}{path_and_query}", settings.base_url()),
                settings.api_key.clone(),
                settings.request_timeout(),
            )
        };

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("Authorization", format!("Bearer {api_key}"))
            .timeout(timeout);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response from {url}: {e}")))?;

        tracing::debug!(
            method = %method,
            path = path_and_query,
            status = status.as_u16(),
            "admin API request completed"
        );

        if !status.is_success() {
            return Err(Error::api(status.as_u16(), text));
        }

        Ok(text)
    }

    /// GET a path and decode the JSON response body
    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let text = self.send(reqwest::Method::GET, path_and_query, None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Ban an IP address
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the ban.
    pub async fn ban(
        &self,
        ip: &str,
        reason: &str,
        duration_seconds: u64,
    ) -> Result<serde_json::Value> {
        let body = serde_json::json!({
            "ip": ip,
            "reason": reason,
            "duration": duration_seconds,
        });
        let text = self
            .send(reqwest::Method::POST, "/admin/ban", Some(&body))
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Remove the ban for an IP address; returns the server's text ack
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no such ban exists.
    pub async fn unban(&self, ip: &str) -> Result<String> {
        let path = format!("/admin/unban?ip={}", urlencoding::encode(ip));
        self.send(reqwest::Method::POST, &path, None).await
    }

    /// Fetch the service configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn get_config(&self) -> Result<ServiceConfig> {
        self.get_json("/admin/config").await
    }

    /// Apply a partial configuration update; only keys present in the patch
    /// are mutated server-side
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn update_config(&self, patch: &ConfigPatch) -> Result<UpdateConfigResponse> {
        let body = serde_json::to_value(patch)?;
        let text = self
            .send(reqwest::Method::POST, "/admin/config", Some(&body))
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch the analytics snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn get_analytics(&self) -> Result<AnalyticsSnapshot> {
        self.get_json("/admin/analytics").await
    }

    /// Fetch the events summary for the given window
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn get_events(&self, filter: EventFilter) -> Result<EventsSummary> {
        let path = format!("/admin/events?{}", filter.query());
        self.get_json(&path).await
    }

    /// Fetch all ban records
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn get_bans(&self) -> Result<BansResponse> {
        self.get_json("/admin/ban").await
    }

    /// Fetch the crawler-trap snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn get_maze(&self) -> Result<MazeSnapshot> {
        self.get_json("/admin/maze").await
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AdminApiClient {
        AdminApiClient::new(ConnectionConfig {
            endpoint: server.uri(),
            api_key: "test-key".to_string(),
            ..ConnectionConfig::default()
        })
    }

    #[tokio::test]
    async fn test_bearer_header_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/analytics"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ban_count": 3, "test_mode": false})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let analytics = client_for(&server).get_analytics().await.unwrap();
        assert_eq!(analytics.ban_count, 3);
        assert!(!analytics.test_mode);
    }

    #[tokio::test]
    async fn test_trailing_slash_endpoint_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/analytics"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ban_count": 0, "test_mode": true})),
            )
            .mount(&server)
            .await;

        let client = AdminApiClient::new(ConnectionConfig {
            endpoint: format!("{}/", server.uri()),
            api_key: "test-key".to_string(),
            ..ConnectionConfig::default()
        });

        let analytics = client.get_analytics().await.unwrap();
        assert!(analytics.test_mode);
    }

    #[tokio::test]
    async fn test_non_2xx_yields_api_error_with_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/analytics"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string("Unauthorized: Invalid or missing API key"),
            )
            .mount(&server)
            .await;

        let error = client_for(&server).get_analytics().await.unwrap_err();
        match error {
            Error::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized: Invalid or missing API key");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ban_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/ban"))
            .and(header("Content-Type", "application/json"))
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

        let ack = client_for(&server)
            .ban("1.2.3.4", "manual_ban", 3600)
            .await
            .unwrap();
        assert_eq!(ack["status"], "banned");
    }

    #[tokio::test]
    async fn test_unban_encodes_ip_and_returns_text_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/unban"))
            .and(query_param("ip", "::1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Unbanned"))
            .expect(1)
            .mount(&server)
            .await;

        let ack = client_for(&server).unban("::1").await.unwrap();
        assert_eq!(ack, "Unbanned");
    }

    #[tokio::test]
    async fn test_update_config_sends_only_patched_keys() {
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

        let response = client_for(&server)
            .update_config(&ConfigPatch::test_mode(true))
            .await
            .unwrap();
        assert!(response.config.test_mode);
    }

    #[tokio::test]
    async fn test_events_filter_queries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/events"))
            .and(query_param("hours", "24"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "event_counts": {"Ban": 2},
                    "top_ips": [["1.2.3.4", 2]],
                    "recent_events": [],
                })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/events"))
            .and(query_param("limit", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let summary = client.get_events(EventFilter::Hours(24)).await.unwrap();
        assert_eq!(summary.event_counts.get("Ban"), Some(&2));

        let summary = client.get_events(EventFilter::Limit(1000)).await.unwrap();
        assert!(summary.recent_events.is_empty());
    }

    #[tokio::test]
    async fn test_network_error_on_unreachable_endpoint() {
        let client = AdminApiClient::new(ConnectionConfig {
            // Reserved TEST-NET-1 address; nothing listens here
            endpoint: "http://192.0.2.1:9".to_string(),
            api_key: "test-key".to_string(),
            request_timeout_seconds: 1,
        });

        let error = client.get_bans().await.unwrap_err();
        assert!(matches!(error, Error::Network { .. }));
    }

    #[tokio::test]
    async fn test_settings_are_read_fresh_per_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/analytics"))
            .and(header("Authorization", "Bearer rotated-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ban_count": 1, "test_mode": false})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.settings().write().api_key = "rotated-key".to_string();

        let analytics = client.get_analytics().await.unwrap();
        assert_eq!(analytics.ban_count, 1);
    }

    #[test]
    fn test_event_filter_query_strings() {
        assert_eq!(EventFilter::Hours(24).query(), "hours=24");
        assert_eq!(EventFilter::Limit(1000).query(), "limit=1000");
    }
}
