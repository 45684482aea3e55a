use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::IpfsConfig;

use super::metadata::TokenMetadata;

/// Dedicated gateway of the pinning provider, used for receipt URLs so a
/// freshly pinned object is immediately resolvable.
const PIN_GATEWAY_BASE: &str = "https://gateway.pinata.cloud";

#[derive(Debug, Error)]
pub enum PinError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("pinning service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("pinning credentials not configured (set PINATA_JWT)")]
    MissingCredentials,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PinReceipt {
    pub ipfs_hash: String,
    pub gateway_url: String,
}

/// Client for a Pinata-style pinning API. Credentials come from the
/// environment only; there is deliberately no fallback literal.
pub struct PinningClient {
    client: Client,
    base_url: String,
    jwt: String,
}

impl PinningClient {
    pub fn new(config: &IpfsConfig) -> Result<Self, PinError> {
        Ok(Self {
            client: Client::new(),
            base_url: config.pinning_base_url.trim_end_matches('/').to_string(),
            jwt: config.pinning_jwt.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt.is_empty()
    }

    /// Pins raw file bytes, returning the content id the chain will store.
    pub async fn pin_file(&self, bytes: Vec<u8>, filename: &str) -> Result<PinReceipt, PinError> {
        self.ensure_credentials()?;

        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.base_url))
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await?;

        self.receipt(response).await
    }

    /// Pins an arbitrary JSON document.
    pub async fn pin_json(&self, document: &serde_json::Value) -> Result<PinReceipt, PinError> {
        self.ensure_credentials()?;

        let response = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.base_url))
            .bearer_auth(&self.jwt)
            .json(document)
            .send()
            .await?;

        self.receipt(response).await
    }

    /// Pins a token metadata document; its content id becomes the token URI
    /// passed to the contract's mint call.
    pub async fn pin_metadata(&self, metadata: &TokenMetadata) -> Result<PinReceipt, PinError> {
        let document = serde_json::to_value(metadata)
            .expect("token metadata serializes to JSON");
        self.pin_json(&document).await
    }

    pub async fn ping(&self) -> bool {
        if !self.is_configured() {
            return false;
        }
        match self
            .client
            .get(format!("{}/data/testAuthentication", self.base_url))
            .bearer_auth(&self.jwt)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Pinning service unreachable: {}", e);
                false
            }
        }
    }

    fn ensure_credentials(&self) -> Result<(), PinError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(PinError::MissingCredentials)
        }
    }

    async fn receipt(&self, response: reqwest::Response) -> Result<PinReceipt, PinError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Pinning API error: {} - {}", status, body);
            return Err(PinError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let pinned: PinResponse = response.json().await?;
        Ok(PinReceipt {
            gateway_url: format!("{}/ipfs/{}", PIN_GATEWAY_BASE, pinned.ipfs_hash),
            ipfs_hash: pinned.ipfs_hash,
        })
    }
}
