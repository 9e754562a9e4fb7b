use std::time::Duration;

use chrono::{Local, TimeZone};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::model::{Error, StatusInfo};

const API_BASE: &str = "https://slack.com/api";

/// Every call shares this timeout; a slow Slack answer fails, it never hangs
/// the session.
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin Slack Web API client for the three calls this app needs:
/// users.profile.get, users.profile.set and auth.test.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Default)]
struct Profile {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    real_name: String,
    #[serde(default)]
    status_text: String,
    #[serde(default)]
    status_emoji: String,
    #[serde(default)]
    status_expiration: i64,
}

#[derive(Deserialize)]
struct ProfileResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    profile: Option<Profile>,
}

impl SlackClient {
    pub fn new(token: &str) -> Result<Self, Error> {
        Self::with_base_url(token, API_BASE)
    }

    /// Internal constructor that can be pointed at a mock server.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .map_err(|e| Error::Remote(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Fetch the current profile and reduce it to the status snapshot shown
    /// on the dashboard.
    pub async fn get_profile(&self) -> Result<StatusInfo, Error> {
        debug!("Fetching current status");
        let resp = self
            .http
            .get(format!("{}/users.profile.get", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(map_transport)?;
        let body: ProfileResponse = resp.json().await.map_err(map_transport)?;
        if !body.ok {
            return Err(api_error(body.error));
        }
        let profile = body.profile.unwrap_or_default();

        let user = if profile.display_name.is_empty() {
            profile.real_name
        } else {
            profile.display_name
        };
        let expiration = if profile.status_expiration > 0 {
            format_local_time(profile.status_expiration)
        } else {
            String::new()
        };
        Ok(StatusInfo {
            user,
            text: profile.status_text,
            emoji: profile.status_emoji,
            expiration,
        })
    }

    /// Set the custom status. `expiration` of 0 means "does not expire".
    pub async fn set_custom_status(
        &self,
        text: &str,
        emoji: &str,
        expiration: i64,
    ) -> Result<(), Error> {
        debug!("Setting status '{}' {} (exp={})", text, emoji, expiration);
        let body = json!({
            "profile": {
                "status_text": text,
                "status_emoji": emoji,
                "status_expiration": expiration,
            }
        });
        let resp = self
            .http
            .post(format!("{}/users.profile.set", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;
        let envelope: ApiEnvelope = resp.json().await.map_err(map_transport)?;
        if !envelope.ok {
            return Err(api_error(envelope.error));
        }
        Ok(())
    }

    /// Check the token against auth.test. Used before a settings save is
    /// persisted.
    pub async fn auth_test(&self) -> Result<(), Error> {
        debug!("Validating token via auth.test");
        let resp = self
            .http
            .post(format!("{}/auth.test", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(map_transport)?;
        let envelope: ApiEnvelope = resp.json().await.map_err(map_transport)?;
        if !envelope.ok {
            return Err(api_error(envelope.error));
        }
        Ok(())
    }
}

fn format_local_time(unix_seconds: i64) -> String {
    Local
        .timestamp_opt(unix_seconds, 0)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

fn map_transport(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Remote("request timed out".into())
    } else {
        Error::Remote(e.to_string())
    }
}

fn api_error(error: Option<String>) -> Error {
    Error::Remote(error.unwrap_or_else(|| "unknown error".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> SlackClient {
        SlackClient::with_base_url("xoxp-test", &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_get_profile_maps_fields() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "ok": true,
            "profile": {
                "display_name": "maxi",
                "real_name": "Max Muster",
                "status_text": "In a meeting",
                "status_emoji": ":calendar:",
                "status_expiration": 0
            }
        });
        Mock::given(method("GET"))
            .and(path("/users.profile.get"))
            .and(header("authorization", "Bearer xoxp-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let info = client_for(&server).await.get_profile().await.unwrap();
        assert_eq!(info.user, "maxi");
        assert_eq!(info.text, "In a meeting");
        assert_eq!(info.emoji, ":calendar:");
        assert_eq!(info.expiration, "");
    }

    #[tokio::test]
    async fn test_get_profile_falls_back_to_real_name() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "ok": true,
            "profile": {
                "display_name": "",
                "real_name": "Max Muster",
                "status_text": "",
                "status_emoji": "",
                "status_expiration": 0
            }
        });
        Mock::given(method("GET"))
            .and(path("/users.profile.get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let info = client_for(&server).await.get_profile().await.unwrap();
        assert_eq!(info.user, "Max Muster");
    }

    #[tokio::test]
    async fn test_get_profile_formats_expiration() {
        let server = MockServer::start().await;
        let exp = Local::now().timestamp() + 3600;
        let body = serde_json::json!({
            "ok": true,
            "profile": { "display_name": "maxi", "status_expiration": exp }
        });
        Mock::given(method("GET"))
            .and(path("/users.profile.get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let info = client_for(&server).await.get_profile().await.unwrap();
        assert_eq!(info.expiration, format_local_time(exp));
        assert_eq!(info.expiration.len(), 5); // HH:MM
    }

    #[tokio::test]
    async fn test_set_custom_status_sends_profile_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users.profile.set"))
            .and(body_partial_json(serde_json::json!({
                "profile": {
                    "status_text": "At lunch",
                    "status_emoji": ":fork_and_knife:",
                    "status_expiration": 1234567890
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .await
            .set_custom_status("At lunch", ":fork_and_knife:", 1234567890)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_api_error_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth.test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": false, "error": "invalid_auth"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.auth_test().await.unwrap_err();
        assert_eq!(err, Error::Remote("invalid_auth".into()));
    }
}
