//! privateer serve command

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;

use shared::ServerConfig;

use crate::host::Host;

pub const DEFAULT_CONFIG_FILE: &str = "privateer.json";

#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Configuration file (defaults to ./privateer.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    /// Resolve the effective configuration, flags taking precedence
    pub fn load_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                read_config(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::warn!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                ServerConfig::default()
            }
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        let addr = config.listen_addr();
        let host = Host::from_config(config)?;

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        tracing::info!("privateer listening on http://{}", addr);

        axum::serve(listener, host.app())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server failure")?;

        Ok(())
    }
}

fn read_config(path: &Path) -> anyhow::Result<ServerConfig> {
    ServerConfig::from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
