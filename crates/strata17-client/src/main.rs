mod config;

use config::ClientConfig;
use std::path::Path;
use std::time::Duration;
use strata17_session::{Session, SessionConfig, SessionPhase};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("starting strata17 client");

    let config = ClientConfig::load(Path::new("config/client.toml"))?;
    info!(host = %config.host, port = config.port, "config loaded");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let mut session = Session::new(SessionConfig {
        host: config.host.clone(),
        port: config.port,
        username: config.username.clone(),
    });

    let mut tick = tokio::time::interval(Duration::from_millis(config.tick_millis));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = session.step() {
                    error!("session step failed: {e}");
                    break;
                }
                if session.is_terminal() {
                    match &session.phase {
                        SessionPhase::Terminated { reason } => info!(reason, "session terminated"),
                        SessionPhase::Failed { reason } => error!(reason, "session failed"),
                        _ => unreachable!(),
                    }
                    break;
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_ok() && *shutdown_rx.borrow() {
                    info!("shutting down");
                    break;
                }
            }
        }
    }

    Ok(())
}
