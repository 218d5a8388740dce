use anyhow::Context;
use doorstep::{config, logging, server};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config::parse_config_path(std::env::args().skip(1))?;
    let config = config::load(&path)?;
    logging::registry_logs(config.logs.level)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    server::run_until_done(&config, listener).await
}
