/// Esplora RPC Proxy
///
/// Lets Esplora clients talk to a bare Bitcoin Core node: each REST request is
/// answered with fresh JSON-RPC queries against the node.

use anyhow::{Context, Result};

use esplora_rpc_proxy::{run_server, ProxyConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for per-call RPC traces)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Esplora RPC proxy...");

    let config = ProxyConfig::from_env().context("Failed to load configuration")?;

    log::info!("Bitcoin RPC URL: {}", config.rpc.url);
    log::info!("RPC timeout: {}s", config.rpc.timeout.as_secs());

    run_server(&config).await.context("Server error")?;

    Ok(())
}
