//! xakac - forwards server-sent events to webhooks.
//!
//! Routes are read from a JSON file (`--config`) or, when no file is
//! given, from `XAKAC_SOURCE_TARGET_*` environment variables. The process
//! then relays every configured stream until SIGINT/SIGTERM/SIGQUIT.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use xakac::{routes, LogWriter, RelayConfig, Subscribe, Supervisor};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON route file (array of {"Source", "Target"} objects).
    /// When absent, routes come from XAKAC_SOURCE_TARGET_* variables.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let routes = routes::discover(cli.config.as_deref())?;
    info!(
        "xakac v{} relaying {} route(s)",
        env!("CARGO_PKG_VERSION"),
        routes.len(),
    );

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let sup = Supervisor::new(RelayConfig::default(), subs);
    sup.run(routes).await?;
    Ok(())
}
