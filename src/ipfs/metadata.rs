use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::gateway::IPFS_SCHEME;

/// The metadata document pinned alongside each minted image and read back
/// by the reconciler's enrichment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<MetadataAttribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: String,
}

/// Builds the document for a freshly pinned image, referencing it by
/// content id so the metadata stays gateway-independent.
pub fn build_metadata(name: &str, description: &str, image_cid: &str) -> TokenMetadata {
    TokenMetadata {
        name: name.to_string(),
        description: description.to_string(),
        image: format!("{}{}", IPFS_SCHEME, image_cid),
        attributes: vec![MetadataAttribute {
            trait_type: "Creation Date".to_string(),
            value: Utc::now().to_rfc3339(),
        }],
    }
}
