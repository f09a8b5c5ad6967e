mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gfg_stats_client::{DEFAULT_PROXY_URL, ProxyClient};
use gfg_stats_logic::{ALL_DIFFICULTIES, SearchOutcome, SearchSession, prelude::*};
use log::info;
use tokio::io::AsyncWriteExt;

use render::DashboardView;

#[derive(Parser)]
#[command(version, about = "Look up GeeksforGeeks profile stats through the stats proxy")]
struct Cli {
    /// Origin of the stats proxy
    #[arg(long, env = "GFG_PROXY_URL", default_value = DEFAULT_PROXY_URL)]
    proxy: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a profile and print its dashboard
    Analyze {
        /// The GFG username to look up
        username: String,
        /// Only list solved problems of this difficulty
        #[arg(short, long, default_value = ALL_DIFFICULTIES)]
        difficulty: String,
        /// Public origin to use in the embed snippet, defaults to the proxy
        #[arg(long)]
        origin: Option<String>,
    },
    /// Download the embeddable SVG stats card
    Card {
        /// The GFG username to render
        username: String,
        /// Where to write the SVG, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

async fn analyze(
    client: ProxyClient,
    username: &str,
    difficulty: &str,
    origin: Option<String>,
) -> Result {
    let origin = origin.unwrap_or_else(|| client.origin().to_string());
    let session = SearchSession::new(client);

    match session.search(username).await {
        SearchOutcome::Loaded => {}
        SearchOutcome::Failed(msg) => bail!(msg),
        SearchOutcome::Superseded => bail!("Search was replaced by a newer one"),
    }

    let state = session.state().await;
    let dashboard = state
        .dashboard
        .context("Search finished without a dashboard")?;

    println!(
        "{}",
        DashboardView {
            dashboard: &dashboard,
            difficulty,
            origin: &origin,
        }
    );

    Ok(())
}

async fn card(client: ProxyClient, username: &str, output: Option<PathBuf>) -> Result {
    let svg = client
        .stats_card(username)
        .await
        .with_context(|| format!("Failed to fetch stats card for {username}"))?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &svg)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} bytes to {}", svg.len(), path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&svg).await.context("Failed to write card")?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();
    let client = ProxyClient::new(&cli.proxy)?;

    match cli.command {
        Commands::Analyze {
            username,
            difficulty,
            origin,
        } => analyze(client, &username, &difficulty, origin).await,
        Commands::Card { username, output } => card(client, &username, output).await,
    }
}
