pub mod gateway;
pub mod metadata;
pub mod pinning;

pub use gateway::{content_url, resolve_uri, ContentFetcher, FetchError, FetchedContent, GatewayClient};
pub use metadata::{build_metadata, MetadataAttribute, TokenMetadata};
pub use pinning::{PinError, PinReceipt, PinningClient};

#[cfg(test)]
pub use gateway::MockContentFetcher;
