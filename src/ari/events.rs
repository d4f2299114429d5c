use futures::stream::{Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::AriConfig;
use crate::error::{OrchestratorError, Result};

/// Connection to the ARI `/events` WebSocket
pub struct EventStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl EventStream {
    /// Connect to ARI events for the configured Stasis application
    pub async fn connect(config: &AriConfig) -> Result<Self> {
        let url = config.events_url();
        info!(
            "Connecting to ARI events at {}:{} (app={})",
            config.host, config.port, config.app_name
        );

        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| OrchestratorError::EventStream(format!("connect failed: {}", e)))?;

        info!("Connected to ARI event stream");

        Ok(Self { socket })
    }

    /// Raw JSON payloads in arrival order.
    ///
    /// Ends when the server closes the socket; transport errors are yielded
    /// as `EventStream` errors.
    pub fn into_messages(self) -> impl Stream<Item = Result<String>> {
        self.socket
            .take_while(|frame| {
                let open = !matches!(frame, Ok(Message::Close(_)));
                if !open {
                    info!("ARI event stream closed by server");
                }
                futures::future::ready(open)
            })
            .filter_map(|frame| {
                futures::future::ready(match frame {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(Message::Binary(bytes)) => {
                        Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {
                        debug!("Skipping control frame");
                        None
                    }
                    Ok(Message::Close(_)) => None,
                    Err(e) => {
                        warn!("ARI event stream error: {}", e);
                        Some(Err(OrchestratorError::EventStream(e.to_string())))
                    }
                })
            })
    }
}
