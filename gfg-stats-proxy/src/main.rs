mod error;
mod routes;
mod state;

use std::{net::SocketAddr, result::Result as StdResult};

use anyhow::Context;
use clap::Parser;
use log::info;
use tokio::{net::TcpListener, signal::ctrl_c};

use state::ProxyState;

type Result<T = (), E = anyhow::Error> = StdResult<T, E>;

#[derive(Parser)]
#[command(version, about = "Validating proxy in front of the GFG stats backend")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Base URL of the scraping backend
    #[arg(long, env = "BACKEND_URL", default_value = "http://127.0.0.1:5000")]
    backend_url: String,
}

async fn shutdown_signal() {
    if let Err(why) = ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {why:?}");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}

#[tokio::main]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();

    let state = ProxyState::new(&cli.backend_url)?;
    info!("Forwarding to backend at {}", cli.backend_url);

    let app = routes::router(state);

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", cli.bind))?;

    info!(
        "Starting GFG stats proxy {} on {}",
        env!("CARGO_PKG_VERSION"),
        cli.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Error while running server")
}
