//! Shift Tac Toe room authority server.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod authority;
mod config;
mod room;
mod server;

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        addr = %config.addr,
        series_length = ?config.default_series_length,
        max_rooms = config.max_rooms,
        "Starting Shift Tac Toe server..."
    );

    server::run_server(config).await
}
