use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::core::config::IpfsConfig;

/// Content-addressing URI scheme used in token URIs and metadata images.
pub const IPFS_SCHEME: &str = "ipfs://";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub ok: bool,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedContent {
    /// Structured metadata is anything the gateway labels as JSON; raw
    /// image bytes come back with an image content type and are left alone.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|value| value.contains("application/json"))
            .unwrap_or(false)
    }
}

/// Gateway URL for a bare content id.
pub fn content_url(gateway_base: &str, content_id: &str) -> String {
    format!("{}/ipfs/{}", gateway_base.trim_end_matches('/'), content_id)
}

/// Rewrites `ipfs://<id>` through the gateway; absolute URLs pass through;
/// anything else is treated as a bare content id.
pub fn resolve_uri(gateway_base: &str, uri: &str) -> String {
    if let Some(content_id) = uri.strip_prefix(IPFS_SCHEME) {
        content_url(gateway_base, content_id)
    } else if uri.starts_with("http://") || uri.starts_with("https://") {
        uri.to_string()
    } else {
        content_url(gateway_base, uri)
    }
}

/// Best-effort content fetch seam consumed by the reconciler's enrichment
/// step. Mockable in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError>;
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(config: &IpfsConfig) -> Result<Self, FetchError> {
        // The enrichment path is best-effort; its own timeout keeps a
        // stalled gateway from stalling listing assembly.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.enrichment_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.gateway_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn ping(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("IPFS gateway unreachable: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl ContentFetcher for GatewayClient {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response.bytes().await?.to_vec();

        Ok(FetchedContent {
            ok: status.is_success(),
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_ipfs_scheme_through_gateway() {
        assert_eq!(
            resolve_uri("https://ipfs.io", "ipfs://abc123"),
            "https://ipfs.io/ipfs/abc123"
        );
    }

    #[test]
    fn passes_absolute_urls_through() {
        assert_eq!(
            resolve_uri("https://ipfs.io", "https://example.com/cat.png"),
            "https://example.com/cat.png"
        );
    }

    #[test]
    fn treats_bare_values_as_content_ids() {
        assert_eq!(
            resolve_uri("https://ipfs.io/", "QmHash"),
            "https://ipfs.io/ipfs/QmHash"
        );
    }

    #[test]
    fn json_detection_requires_a_json_content_type() {
        let mut content = FetchedContent {
            ok: true,
            status: 200,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: Vec::new(),
        };
        assert!(content.is_json());

        content.content_type = Some("image/png".to_string());
        assert!(!content.is_json());

        content.content_type = None;
        assert!(!content.is_json());
    }
}
