use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikifs_server::state::AppState;
use wikifs_server::{build_router, DEFAULT_PORT};

/// Lock-and-revision server for a wiki content root.
#[derive(Parser, Debug)]
#[command(name = "wikifs-server")]
struct Cli {
    /// Directory containing wiki files, lock siblings, and `users.db`.
    wikifs_root: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wikifs_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let state = match AppState::new(cli.wikifs_root.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize server state");
            std::process::exit(1);
        }
    };

    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT));
    tracing::info!(%addr, root = %cli.wikifs_root.display(), "listening");

    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}
