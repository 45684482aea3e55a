use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::core::config::ChainConfig;

use super::error::ChainError;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal Ethereum JSON-RPC transport. Only the read-side methods the
/// marketplace needs; transactions are signed and submitted by the user's
/// wallet, never by this service.
pub struct RpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.rpc_url.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let payload = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("RPC endpoint error: {} - {}", status, body);
            return Err(ChainError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let rpc_response: JsonRpcResponse<T> = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or(ChainError::EmptyResult)
    }

    /// `eth_call` against the latest block. `from` matters for views that
    /// read `msg.sender`, like the contract's owner-scoped queries.
    pub async fn eth_call(
        &self,
        to: &str,
        from: Option<&str>,
        data: &str,
    ) -> Result<String, ChainError> {
        let mut call = serde_json::json!({ "to": to, "data": data });
        if let Some(from) = from {
            call["from"] = serde_json::json!(from);
        }
        self.request("eth_call", serde_json::json!([call, "latest"]))
            .await
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        let quantity: String = self.request("eth_chainId", serde_json::json!([])).await?;
        parse_quantity(&quantity)
    }

    pub async fn block_number(&self) -> Result<u64, ChainError> {
        let quantity: String = self
            .request("eth_blockNumber", serde_json::json!([]))
            .await?;
        parse_quantity(&quantity)
    }
}

fn parse_quantity(value: &str) -> Result<u64, ChainError> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|_| ChainError::InvalidQuantity(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x2a").unwrap(), 42);
        assert_eq!(parse_quantity("ff").unwrap(), 255);
    }

    #[test]
    fn rejects_malformed_quantities() {
        assert!(matches!(
            parse_quantity("0xzz"),
            Err(ChainError::InvalidQuantity(_))
        ));
        assert!(matches!(
            parse_quantity(""),
            Err(ChainError::InvalidQuantity(_))
        ));
    }
}
