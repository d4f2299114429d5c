use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{error, info};

use super::messages::{Bridge, Channel};
use crate::config::AriConfig;
use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Raw ARI response with its decoded JSON body (`Null` when empty)
#[derive(Debug, Clone)]
pub struct AriResponse {
    pub status: u16,
    pub endpoint: String,
    pub body: Value,
}

impl AriResponse {
    /// Identity of the resource the call created (the body's `id` field)
    pub fn id(&self) -> Result<String> {
        self.body
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| OrchestratorError::MalformedResponse {
                endpoint: self.endpoint.clone(),
                reason: "response has no string `id` field".to_string(),
            })
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            OrchestratorError::MalformedResponse {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        })
    }
}

/// Parameters of an `externalMedia` channel (media fork)
#[derive(Debug, Clone)]
pub struct ExternalMediaParams {
    pub app: String,
    /// `host:port` the PBX sends the forked audio to
    pub external_host: String,
    pub format: String,
    pub connection_type: String,
    pub direction: String,
}

impl ExternalMediaParams {
    /// Bidirectional client-mode fork to `host:port`
    pub fn new(app: &str, host: &str, port: u16, format: &str) -> Self {
        Self {
            app: app.to_string(),
            external_host: format!("{}:{}", host, port),
            format: format.to_string(),
            connection_type: "client".to_string(),
            direction: "both".to_string(),
        }
    }

    fn query(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("app", &self.app)
            .append_pair("external_host", &self.external_host)
            .append_pair("format", &self.format)
            .append_pair("connection_type", &self.connection_type)
            .append_pair("direction", &self.direction)
            .finish()
    }
}

/// Thin ARI REST client. Performs no retries.
pub struct AriClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    default_timeout: Duration,
}

impl AriClient {
    pub fn new(config: &AriConfig) -> Self {
        Self::with_base_url(
            config.base_url(),
            Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            },
            config.request_timeout(),
        )
    }

    /// Point the client at an explicit `/ari` base URL
    pub fn with_base_url(
        base_url: impl Into<String>,
        credentials: Credentials,
        default_timeout: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            default_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request against `endpoint` (path plus encoded query)
    pub async fn invoke(
        &self,
        method: Method,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<AriResponse> {
        let url = format!("{}{}", self.base_url, endpoint);
        info!("{} request: {}", method, url);

        let response = self
            .http
            .request(method.clone(), &url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                error!("{} {} failed: {}", method, url, e);
                OrchestratorError::ControlServerUnreachable {
                    method: method.to_string(),
                    endpoint: endpoint.to_string(),
                    source: e,
                }
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            error!("{} {} body read failed: {}", method, url, e);
            OrchestratorError::ControlServerUnreachable {
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                source: e,
            }
        })?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            error!("{} {} rejected with {}: {}", method, url, status, body);
            return Err(OrchestratorError::ControlServerRejected {
                method: method.to_string(),
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| OrchestratorError::MalformedResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?
        };

        info!("{} {} -> {} {}", method, url, status, body);

        Ok(AriResponse {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            body,
        })
    }

    pub async fn get(&self, endpoint: &str) -> Result<AriResponse> {
        self.invoke(Method::GET, endpoint, self.default_timeout).await
    }

    pub async fn post(&self, endpoint: &str) -> Result<AriResponse> {
        self.invoke(Method::POST, endpoint, self.default_timeout).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<AriResponse> {
        self.invoke(Method::DELETE, endpoint, self.default_timeout).await
    }

    pub async fn answer_channel(&self, channel_id: &str) -> Result<()> {
        self.post(&format!("/channels/{}/answer", channel_id)).await?;
        Ok(())
    }

    /// Create an `externalMedia` channel forking audio to `params.external_host`
    pub async fn create_external_media(&self, params: &ExternalMediaParams) -> Result<Channel> {
        self.post(&format!("/channels/externalMedia?{}", params.query()))
            .await?
            .decode()
    }

    pub async fn create_bridge(&self, bridge_type: &str) -> Result<Bridge> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("type", bridge_type)
            .finish();
        self.post(&format!("/bridges?{}", query)).await?.decode()
    }

    pub async fn add_channel_to_bridge(&self, bridge_id: &str, channel_id: &str) -> Result<()> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("channel", channel_id)
            .finish();
        self.post(&format!("/bridges/{}/addChannel?{}", bridge_id, query))
            .await?;
        Ok(())
    }

    pub async fn get_bridge(&self, bridge_id: &str) -> Result<Bridge> {
        self.get(&format!("/bridges/{}", bridge_id)).await?.decode()
    }

    pub async fn hangup_channel(&self, channel_id: &str) -> Result<()> {
        self.delete(&format!("/channels/{}", channel_id)).await?;
        Ok(())
    }

    pub async fn destroy_bridge(&self, bridge_id: &str) -> Result<()> {
        self.delete(&format!("/bridges/{}", bridge_id)).await?;
        Ok(())
    }
}
