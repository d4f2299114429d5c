use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::ari::{AriClient, ExternalMediaParams};
use crate::config::{AriConfig, MediaConfig};
use crate::error::{OrchestratorError, Result, SetupStep};

/// Request to bridge one inbound channel to a local media listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupRequest {
    pub caller_id: String,
    pub channel_id: String,
    pub port: u16,
}

/// Mixing bridge created for one call, with the channels joined to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTopology {
    pub bridge_id: String,
    /// Originating channel first, then the media-fork channel
    pub channel_ids: Vec<String>,
}

/// Anything that can bring up the media path for a new call
#[async_trait::async_trait]
pub trait CallSetup: Send + Sync {
    async fn execute(&self, request: &SetupRequest) -> Result<()>;
}

/// Runs answer, fork-media, create-bridge, add-channel x2 and fetch-bridge
/// against ARI, stopping at the first failure.
///
/// Partially created channels and bridges are left for Asterisk to reap on
/// hangup.
pub struct CallSetupSequencer {
    client: Arc<AriClient>,
    app_name: String,
    media_host: String,
    media_format: String,
}

impl CallSetupSequencer {
    pub fn new(client: Arc<AriClient>, ari: &AriConfig, media: &MediaConfig) -> Self {
        Self {
            client,
            app_name: ari.app_name.clone(),
            media_host: media.external_host.clone(),
            media_format: media.format.clone(),
        }
    }

    pub async fn set_up_call(&self, channel_id: &str, port: u16) -> Result<BridgeTopology> {
        info!("Setting up call for channel {} on port {}", channel_id, port);

        self.client
            .answer_channel(channel_id)
            .await
            .map_err(aborted(SetupStep::Answer))?;

        let params =
            ExternalMediaParams::new(&self.app_name, &self.media_host, port, &self.media_format);
        let fork = self
            .client
            .create_external_media(&params)
            .await
            .map_err(aborted(SetupStep::ForkMedia))?;
        info!("Created media fork channel {} -> {}", fork.id, params.external_host);

        let bridge = self
            .client
            .create_bridge("mixing")
            .await
            .map_err(aborted(SetupStep::CreateBridge))?;
        info!("Created mixing bridge {}", bridge.id);

        let channel_ids = vec![channel_id.to_string(), fork.id];
        for id in &channel_ids {
            self.client
                .add_channel_to_bridge(&bridge.id, id)
                .await
                .map_err(aborted(SetupStep::AddChannel))?;
        }

        let state = self
            .client
            .get_bridge(&bridge.id)
            .await
            .map_err(aborted(SetupStep::FetchBridge))?;
        info!("Bridge {} now holds channels {:?}", state.id, state.channels);

        Ok(BridgeTopology {
            bridge_id: bridge.id,
            channel_ids,
        })
    }
}

fn aborted(step: SetupStep) -> impl FnOnce(OrchestratorError) -> OrchestratorError {
    move |e| {
        error!("Call setup failed at step {}: {}", step, e);
        OrchestratorError::SetupSequenceAborted {
            step,
            source: Box::new(e),
        }
    }
}

#[async_trait::async_trait]
impl CallSetup for CallSetupSequencer {
    async fn execute(&self, request: &SetupRequest) -> Result<()> {
        self.set_up_call(&request.channel_id, request.port).await?;
        Ok(())
    }
}
