use serde::{Deserialize, Serialize};

/// Event pushed over the ARI WebSocket
///
/// Only the fields the orchestrator reads are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AriEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub channel: Option<Channel>,
}

/// One call leg as known to Asterisk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub caller: CallerId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallerId {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
}

/// Mixing bridge returned by `/bridges` endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bridge {
    pub id: String,
    #[serde(default)]
    pub bridge_type: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
}
