use anyhow::Result;
use clap::Parser;
use huddle_relay::RelayState;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "huddle-relay", about = "Room-scoped WebRTC signaling relay")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:6969")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let state = RelayState::new();
    let app = huddle_relay::router(state);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!("relay listening on {}", args.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
