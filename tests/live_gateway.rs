use nft_marketplace_gallery::core::config::IpfsConfig;
use nft_marketplace_gallery::ipfs::{content_url, ContentFetcher, GatewayClient};

fn public_gateway_config() -> IpfsConfig {
    IpfsConfig {
        gateway_base_url: "https://ipfs.io".to_string(),
        pinning_base_url: "https://api.pinata.cloud".to_string(),
        pinning_jwt: String::new(),
        enrichment_timeout_secs: 20,
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --nocapture
async fn fetches_known_content_from_public_gateway() {
    let config = public_gateway_config();
    let client = GatewayClient::new(&config).unwrap();

    // The IPFS project's well-known "hello" object.
    let url = content_url(
        client.base_url(),
        "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG/readme",
    );
    let content = client.fetch(&url).await.unwrap();

    assert!(content.ok, "gateway returned status {}", content.status);
    assert!(!content.body.is_empty());
}

#[tokio::test]
#[ignore]
async fn gateway_ping_succeeds_against_public_gateway() {
    let config = public_gateway_config();
    let client = GatewayClient::new(&config).unwrap();
    assert!(client.ping().await);
}
