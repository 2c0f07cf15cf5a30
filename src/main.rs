use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use vizpilot::{config::Config, routes::create_router, utils::init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the log directory is known
    let config = Config::from_env()?;
    let _log_guard = init_tracing(&config.logging);
    info!("Configuration loaded: {:?}", config.server);

    let state = AppState::from_config(config.clone());
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid HOST/PORT: {}", e))?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
