use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Service-wide counters, registered against one registry and shared via
/// `Arc` by everything that observes an event.
pub struct Metrics {
    registry: Registry,
    pub listings_built: IntCounter,
    pub chain_read_failures: IntCounter,
    pub enrichment_failures: IntCounter,
    pub enrichment_applied: IntCounter,
    pub pin_requests: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let listings_built = IntCounter::new(
            "listings_built_total",
            "Display listings assembled from chain records",
        )?;
        let chain_read_failures = IntCounter::new(
            "chain_read_failures_total",
            "Mandatory chain reads that failed",
        )?;
        let enrichment_failures = IntCounter::new(
            "enrichment_failures_total",
            "Metadata enrichment attempts that fell back to defaults",
        )?;
        let enrichment_applied = IntCounter::new(
            "enrichment_applied_total",
            "Listings that received at least one metadata override",
        )?;
        let pin_requests = IntCounter::new(
            "pin_requests_total",
            "Requests forwarded to the pinning service",
        )?;

        registry.register(Box::new(listings_built.clone()))?;
        registry.register(Box::new(chain_read_failures.clone()))?;
        registry.register(Box::new(enrichment_failures.clone()))?;
        registry.register(Box::new(enrichment_applied.clone()))?;
        registry.register(Box::new(pin_requests.clone()))?;

        Ok(Self {
            registry,
            listings_built,
            chain_read_failures,
            enrichment_failures,
            enrichment_applied,
            pin_requests,
        })
    }

    /// Prometheus text exposition of every registered counter.
    pub fn export(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_exposition() {
        let metrics = Metrics::new().unwrap();
        metrics.listings_built.inc();
        metrics.enrichment_failures.inc();

        let exported = metrics.export();
        assert!(exported.contains("listings_built_total 1"));
        assert!(exported.contains("enrichment_failures_total 1"));
        assert!(exported.contains("chain_read_failures_total 0"));
    }
}
