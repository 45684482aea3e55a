use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;

use crate::chain::{format_price, ChainError, ChainReader};
use crate::ipfs::gateway::{content_url, resolve_uri, ContentFetcher, IPFS_SCHEME};
use crate::monitoring::Metrics;

use super::types::{DisplayListing, DEFAULT_DESCRIPTION};

/// Recognized fields of an off-chain metadata document. Everything else in
/// the payload is ignored.
#[derive(Debug, Default, Deserialize)]
struct EnrichmentPayload {
    name: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

/// Assembles display listings by combining the mandatory on-chain record
/// with best-effort off-chain metadata. Enrichment can only ever improve a
/// listing; any enrichment failure leaves the chain-derived defaults
/// standing.
pub struct ListingReconciler {
    chain: Arc<dyn ChainReader>,
    fetcher: Arc<dyn ContentFetcher>,
    gateway_base: String,
    batch_concurrency: usize,
    metrics: Arc<Metrics>,
}

impl ListingReconciler {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        fetcher: Arc<dyn ContentFetcher>,
        gateway_base: impl Into<String>,
        batch_concurrency: usize,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            chain,
            fetcher,
            gateway_base: gateway_base.into(),
            batch_concurrency: batch_concurrency.max(1),
            metrics,
        }
    }

    /// One listing. The chain read is mandatory and single-attempt: if it
    /// fails, there is no listing. Metadata enrichment afterwards is
    /// strictly additive and its failures are swallowed here.
    pub async fn build_listing(&self, token_id: u64) -> Result<DisplayListing, ChainError> {
        let record = match self.chain.token_record(token_id).await {
            Ok(record) => record,
            Err(e) => {
                self.metrics.chain_read_failures.inc();
                return Err(e);
            }
        };

        let mut listing = DisplayListing {
            token_id: record.token_id,
            owner: record.owner.to_string(),
            price: format_price(record.price),
            image_url: resolve_uri(&self.gateway_base, &record.content_id),
            name: format!("NFT #{}", record.token_id),
            description: DEFAULT_DESCRIPTION.to_string(),
        };

        self.enrich(&mut listing, &record.content_id).await;
        self.metrics.listings_built.inc();

        Ok(listing)
    }

    /// Overwrites display fields from the content behind `content_id`, when
    /// that content turns out to be structured metadata. Raw image bytes,
    /// gateway errors, timeouts, and unparseable payloads all leave the
    /// defaults untouched.
    async fn enrich(&self, listing: &mut DisplayListing, content_id: &str) {
        // Token URIs are usually bare content ids, but ipfs:// and absolute
        // URLs resolve too.
        let url = resolve_uri(&self.gateway_base, content_id);

        let content = match self.fetcher.fetch(&url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Could not load metadata for NFT {}: {}", listing.token_id, e);
                self.metrics.enrichment_failures.inc();
                return;
            }
        };

        if !content.ok {
            tracing::debug!(
                "Metadata fetch for NFT {} returned status {}",
                listing.token_id,
                content.status
            );
            self.metrics.enrichment_failures.inc();
            return;
        }

        if !content.is_json() {
            // Content id points straight at an asset; the default image URL
            // already resolves it.
            tracing::debug!("NFT {} content is not structured metadata", listing.token_id);
            return;
        }

        let payload: EnrichmentPayload = match serde_json::from_slice(&content.body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Could not parse metadata for NFT {}: {}", listing.token_id, e);
                self.metrics.enrichment_failures.inc();
                return;
            }
        };

        let mut applied = false;
        if let Some(name) = payload.name.filter(|value| !value.is_empty()) {
            listing.name = name;
            applied = true;
        }
        if let Some(description) = payload.description.filter(|value| !value.is_empty()) {
            listing.description = description;
            applied = true;
        }
        if let Some(image) = payload.image.filter(|value| !value.is_empty()) {
            listing.image_url = match image.strip_prefix(IPFS_SCHEME) {
                Some(content_id) => content_url(&self.gateway_base, content_id),
                None => image,
            };
            applied = true;
        }
        if applied {
            self.metrics.enrichment_applied.inc();
        }
    }

    /// Builds listings for each id with bounded parallelism. `buffered`
    /// yields results in input order, so display order follows the input
    /// regardless of which network call completes first. A failed mandatory
    /// read skips that id without aborting the rest.
    pub async fn build_batch(&self, token_ids: &[u64]) -> Vec<DisplayListing> {
        futures::stream::iter(token_ids.iter().copied())
            .map(|token_id| async move { (token_id, self.build_listing(token_id).await) })
            .buffered(self.batch_concurrency)
            .filter_map(|(token_id, result)| async move {
                match result {
                    Ok(listing) => Some(listing),
                    Err(e) => {
                        tracing::warn!("Skipping NFT {}: {}", token_id, e);
                        None
                    }
                }
            })
            .collect()
            .await
    }

    /// Every minted token, in mint order.
    pub async fn build_all(&self) -> Result<Vec<DisplayListing>, ChainError> {
        let count = self.chain.token_count().await?;
        let token_ids: Vec<u64> = (0..count).collect();
        Ok(self.build_batch(&token_ids).await)
    }

    /// Listings for the tokens held by one account.
    pub async fn build_for_owner(&self, owner: &str) -> Result<Vec<DisplayListing>, ChainError> {
        let token_ids = self.chain.tokens_of(owner).await?;
        Ok(self.build_batch(&token_ids).await)
    }
}
