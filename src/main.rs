use std::sync::Arc;

use anyhow::{Context, Result};
use ari_orchestrator::{
    create_router, AppState, AriClient, CallSetup, CallSetupSequencer, Config, Dispatcher,
    EventStream, MediaListenerFactory, PortAllocator, SessionRegistry, SetupNotifier,
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Answers inbound Stasis calls, forks their media to local listeners and
/// supervises one worker per call.
#[derive(Debug, Parser)]
#[command(name = "ari-orchestrator", version)]
struct Cli {
    /// Config file (without extension); missing files are ignored
    #[arg(long, default_value = "config/ari-orchestrator")]
    config: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("ARI endpoint: {}", cfg.ari.base_url());

    let client = Arc::new(AriClient::new(&cfg.ari));
    let sequencer = Arc::new(CallSetupSequencer::new(
        Arc::clone(&client),
        &cfg.ari,
        &cfg.media,
    ));
    let registry = Arc::new(SessionRegistry::new());
    let ports = Arc::new(
        PortAllocator::new(cfg.media.port_min, cfg.media.port_max)
            .context("Invalid media port range")?,
    );
    let (port_min, port_max) = ports.range();
    info!(
        "Media ports {}-{} forked to {}",
        port_min, port_max, cfg.media.external_host
    );

    let setup: Arc<dyn CallSetup> = match &cfg.dispatch.setup_url {
        Some(url) => {
            info!("Delegating call setup to {}", url);
            Arc::new(SetupNotifier::new(url, cfg.dispatch.setup_timeout()))
        }
        None => sequencer.clone(),
    };

    if cfg.service.http.enabled {
        let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server on {}", addr))?;
        let router = create_router(AppState::new(Arc::clone(&sequencer), Arc::clone(&registry)));

        info!("HTTP server listening on {}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("HTTP server failed: {}", e);
            }
        });
    }

    let mut dispatcher = Dispatcher::new(
        &cfg.dispatch,
        ports,
        setup,
        Arc::new(MediaListenerFactory::new(cfg.media.listen_host.clone())),
        Arc::clone(&registry),
    );

    let events = EventStream::connect(&cfg.ari)
        .await
        .context("Failed to connect to ARI event stream")?;

    let outcome = tokio::select! {
        result = dispatcher.run(events.into_messages()) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    dispatcher.shutdown().await;

    outcome.context("ARI event stream failed")?;
    info!("Stopped");

    Ok(())
}
