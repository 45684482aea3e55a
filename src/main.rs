use anyhow::Result;
use std::sync::Arc;

use nft_marketplace_gallery::chain::{MarketplaceContract, RpcClient};
use nft_marketplace_gallery::core::{logging, Config, HealthChecker};
use nft_marketplace_gallery::ipfs::{GatewayClient, PinningClient};
use nft_marketplace_gallery::listing::ListingReconciler;
use nft_marketplace_gallery::monitoring::Metrics;
use nft_marketplace_gallery::server::{self, AppContext};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🚀 NFT marketplace gallery starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Marketplace contract: {}", config.chain.contract_address);
    tracing::info!("IPFS gateway: {}", config.ipfs.gateway_base_url);

    let rpc = Arc::new(RpcClient::new(&config.chain)?);
    let contract = Arc::new(MarketplaceContract::new(rpc, &config.chain)?);
    let gateway = Arc::new(GatewayClient::new(&config.ipfs)?);
    let pinning = Arc::new(PinningClient::new(&config.ipfs)?);
    let metrics = Arc::new(Metrics::new()?);
    let health = Arc::new(HealthChecker::new());

    if !pinning.is_configured() {
        tracing::warn!("⚠️  PINATA_JWT not set; pinning endpoints disabled");
    }

    match contract.verify_chain_id(config.chain.chain_id).await {
        Ok(true) => tracing::info!("✅ RPC endpoint serves chain {}", config.chain.chain_id),
        Ok(false) => tracing::warn!(
            "⚠️  RPC endpoint does not serve configured chain {}",
            config.chain.chain_id
        ),
        Err(e) => tracing::warn!("Could not verify chain id at startup: {}", e),
    }

    let reconciler = Arc::new(ListingReconciler::new(
        contract.clone(),
        gateway.clone(),
        config.ipfs.gateway_base_url.clone(),
        config.reconciler.batch_concurrency,
        metrics.clone(),
    ));

    let ctx = AppContext {
        reconciler,
        contract: contract.clone(),
        pinning: pinning.clone(),
        health: health.clone(),
        metrics,
    };

    let port = config.monitoring.server_port;
    tokio::spawn(async move { server::serve(ctx, port).await });
    tracing::info!("✅ API listening on port {}", port);

    // Probe collaborators and keep health current
    loop {
        let chain_up = contract.ping().await;
        let gateway_up = gateway.ping().await;
        let pinning_up = pinning.ping().await;

        health.update_component("chain_rpc", chain_up).await;
        health.update_component("ipfs_gateway", gateway_up).await;
        health.update_component("pinning_api", pinning_up).await;

        let status = health.get_status().await;
        tracing::info!(
            "Gallery status: {} (uptime: {}s, chain: {}, gateway: {}, pinning: {})",
            status.status,
            status.uptime_seconds,
            chain_up,
            gateway_up,
            pinning_up
        );

        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
    }
}
