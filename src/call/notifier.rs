use std::time::Duration;

use tracing::{error, info};

use super::setup::{CallSetup, SetupRequest};
use crate::error::{OrchestratorError, Result};

/// Delegates call setup to a remote `/set_up_call` surface
pub struct SetupNotifier {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl SetupNotifier {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("{}/set_up_call", base_url.trim_end_matches('/')),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl CallSetup for SetupNotifier {
    async fn execute(&self, request: &SetupRequest) -> Result<()> {
        info!(
            "Requesting setup of channel {} on port {} from {}",
            request.channel_id, request.port, self.url
        );

        let response = self
            .http
            .post(&self.url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| OrchestratorError::ControlServerUnreachable {
                method: "POST".to_string(),
                endpoint: self.url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Setup request for {} rejected with {}", request.channel_id, status);
            return Err(OrchestratorError::ControlServerRejected {
                method: "POST".to_string(),
                endpoint: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
