use serde::Serialize;

/// Placeholder shown when no metadata description could be recovered.
pub const DEFAULT_DESCRIPTION: &str = "No description available";

/// Display-ready view of one token: the authoritative chain fields plus
/// display fields that always carry either metadata values or defaults.
/// Ephemeral; recomputed on every request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayListing {
    pub token_id: u64,
    pub owner: String,
    pub price: String,
    pub image_url: String,
    pub name: String,
    pub description: String,
}
