use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub chain: ChainConfig,
    pub ipfs: IpfsConfig,
    pub reconciler: ReconcilerConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub chain_id: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpfsConfig {
    pub gateway_base_url: String,
    pub pinning_base_url: String,
    /// Pinata JWT, environment-only. Empty disables the pinning endpoints.
    pub pinning_jwt: String,
    pub enrichment_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    pub batch_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub server_port: u16,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            chain: ChainConfig {
                rpc_url: env::var("CHAIN_RPC_URL")
                    .unwrap_or_else(|_| "https://plume-testnet.rpc.thirdweb.com".to_string()),
                contract_address: env::var("MARKETPLACE_ADDRESS")
                    .unwrap_or_else(|_| "0x2c87064a63bfd4b9ad347540b7da055e7f8ae23c".to_string()),
                chain_id: env::var("CHAIN_ID")
                    .unwrap_or_else(|_| "161221135".to_string())
                    .parse()
                    .unwrap_or(161221135),
                request_timeout_secs: env::var("CHAIN_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            ipfs: IpfsConfig {
                gateway_base_url: env::var("IPFS_GATEWAY_BASE_URL")
                    .unwrap_or_else(|_| "https://ipfs.io".to_string()),
                pinning_base_url: env::var("PINNING_BASE_URL")
                    .unwrap_or_else(|_| "https://api.pinata.cloud".to_string()),
                pinning_jwt: env::var("PINATA_JWT").unwrap_or_default(),
                enrichment_timeout_secs: env::var("ENRICHMENT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            reconciler: ReconcilerConfig {
                batch_concurrency: env::var("BATCH_CONCURRENCY")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()
                    .unwrap_or(8),
            },
            monitoring: MonitoringConfig {
                server_port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}
