use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub chain_rpc: bool,
    pub ipfs_gateway: bool,
    pub pinning_api: bool,
    #[serde(flatten)]
    pub extra: HashMap<String, bool>,
}

impl ComponentHealth {
    pub fn get(&self, key: &str) -> Option<bool> {
        match key {
            "chain_rpc" => Some(self.chain_rpc),
            "ipfs_gateway" => Some(self.ipfs_gateway),
            "pinning_api" => Some(self.pinning_api),
            _ => self.extra.get(key).copied(),
        }
    }
}

#[derive(Clone)]
pub struct HealthChecker {
    start_time: std::time::Instant,
    status: Arc<RwLock<ComponentHealth>>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
            status: Arc::new(RwLock::new(ComponentHealth {
                chain_rpc: false,
                ipfs_gateway: false,
                pinning_api: false,
                extra: HashMap::new(),
            })),
        }
    }

    pub async fn get_status(&self) -> HealthStatus {
        let components = self.status.read().await.clone();

        HealthStatus {
            // The chain read is the mandatory path; the gateway and the
            // pinning API only degrade the service.
            status: if components.chain_rpc {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
        }
    }

    pub async fn update_component(&self, component: &str, healthy: bool) {
        let mut status = self.status.write().await;
        match component {
            "chain_rpc" => status.chain_rpc = healthy,
            "ipfs_gateway" => status.ipfs_gateway = healthy,
            "pinning_api" => status.pinning_api = healthy,
            _ => {
                status.extra.insert(component.to_string(), healthy);
            }
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_degraded_until_chain_rpc_is_up() {
        let checker = HealthChecker::new();
        assert_eq!(checker.get_status().await.status, "degraded");

        checker.update_component("chain_rpc", true).await;
        let status = checker.get_status().await;
        assert_eq!(status.status, "healthy");
        assert_eq!(status.components.get("chain_rpc"), Some(true));
        assert_eq!(status.components.get("pinning_api"), Some(false));
    }
}
