use oinky::{OinkyServer, ServerConfig};
use tracing_subscriber::{EnvFilter, fmt};

/// Usage: `oinky-server [BIND_ADDR]`, e.g. `oinky-server 127.0.0.1:4000`.
///
/// Log verbosity follows `RUST_LOG` (default `info`).
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut config = ServerConfig::default();
    if let Some(addr) = std::env::args().nth(1) {
        config.bind_addr = addr;
    }

    let server = OinkyServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server.run().await?;
    Ok(())
}
