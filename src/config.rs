use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub ari: AriConfig,
    pub media: MediaConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "ari-orchestrator".to_string(),
            http: HttpConfig::default(),
        }
    }
}

/// Bind address of the setup notification surface
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Connection settings for the Asterisk REST Interface
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AriConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Stasis application name events are subscribed for
    pub app_name: String,
    pub request_timeout_ms: u64,
    /// Use https/wss instead of http/ws
    pub secure: bool,
}

impl AriConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}/ari", scheme, self.host, self.port)
    }

    pub fn events_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("api_key", &format!("{}:{}", self.username, self.password))
            .append_pair("app", &self.app_name)
            .finish();
        format!("{}://{}:{}/ari/events?{}", scheme, self.host, self.port, query)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for AriConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
            username: String::new(),
            password: String::new(),
            app_name: "callilexa".to_string(),
            request_timeout_ms: 10_000,
            secure: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Host the PBX forks call audio to
    pub external_host: String,
    /// Local address workers bind their listeners on
    pub listen_host: String,
    /// Audio format requested for the media fork (e.g. "ulaw")
    pub format: String,
    pub port_min: u16,
    pub port_max: u16,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            external_host: "0.0.0.0".to_string(),
            listen_host: "0.0.0.0".to_string(),
            format: "ulaw".to_string(),
            port_min: 4000,
            port_max: 4999,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Substring a channel name must contain to be managed (e.g. "PJSIP")
    pub channel_filter: String,
    pub worker_pool_size: usize,
    pub stop_timeout_ms: u64,
    /// When set, setup is delegated to a remote `/set_up_call` surface
    pub setup_url: Option<String>,
    pub setup_timeout_ms: u64,
}

impl DispatchConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn setup_timeout(&self) -> Duration {
        Duration::from_millis(self.setup_timeout_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel_filter: "PJSIP".to_string(),
            worker_pool_size: 10,
            stop_timeout_ms: 30_000,
            setup_url: None,
            setup_timeout_ms: 3_000,
        }
    }
}

impl Config {
    /// Load from an optional config file, then `ORCHESTRATOR__*` environment
    /// variables, then the legacy `ASTERISK_SERVER_IP` / `ARI_USERNAME` /
    /// `ARI_PASSWORD` variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ORCHESTRATOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("ari.host", std::env::var("ASTERISK_SERVER_IP").ok())?
            .set_override_option("ari.username", std::env::var("ARI_USERNAME").ok())?
            .set_override_option("ari.password", std::env::var("ARI_PASSWORD").ok())?
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_legacy_deployment() {
        let cfg = Config::default();

        assert_eq!(cfg.ari.port, 8088);
        assert_eq!(cfg.ari.app_name, "callilexa");
        assert_eq!(cfg.ari.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.media.port_min, 4000);
        assert_eq!(cfg.media.port_max, 4999);
        assert_eq!(cfg.dispatch.channel_filter, "PJSIP");
        assert_eq!(cfg.dispatch.worker_pool_size, 10);
        assert_eq!(cfg.dispatch.setup_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_urls() {
        let ari = AriConfig {
            host: "10.0.0.5".to_string(),
            username: "asterisk".to_string(),
            password: "secret".to_string(),
            ..AriConfig::default()
        };

        assert_eq!(ari.base_url(), "http://10.0.0.5:8088/ari");
        assert_eq!(
            ari.events_url(),
            "ws://10.0.0.5:8088/ari/events?api_key=asterisk%3Asecret&app=callilexa"
        );
    }
}
