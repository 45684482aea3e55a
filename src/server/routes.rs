use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Reply};

use crate::chain::{parse_price, ChainError, ChainReader, MarketplaceContract};
use crate::core::HealthChecker;
use crate::ipfs::{build_metadata, PinError, PinningClient};
use crate::listing::ListingReconciler;
use crate::monitoring::Metrics;

/// Single user-facing message for any chain failure; per-item diagnostics
/// stay in the logs.
const CHAIN_UNAVAILABLE: &str = "Marketplace is currently unavailable";

const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppContext {
    pub reconciler: Arc<ListingReconciler>,
    pub contract: Arc<MarketplaceContract>,
    pub pinning: Arc<PinningClient>,
    pub health: Arc<HealthChecker>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Deserialize)]
struct PinFileQuery {
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PinMetadataRequest {
    name: String,
    description: String,
    image_cid: String,
}

#[derive(Debug, Deserialize)]
struct MintRequest {
    metadata_cid: String,
    price: String,
}

#[derive(Debug, Deserialize)]
struct BuyRequest {
    token_id: u64,
    price: String,
}

pub async fn serve(ctx: AppContext, port: u16) {
    let health = warp::path!("health")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and_then(health_handler);

    let metrics = warp::path!("metrics")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and_then(metrics_handler);

    let listings = warp::path!("api" / "listings")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and_then(listings_handler);

    let listing = warp::path!("api" / "listings" / u64)
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and_then(listing_handler);

    let owner_listings = warp::path!("api" / "owners" / String / "listings")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and_then(owner_listings_handler);

    let pin_file = warp::path!("api" / "pins" / "file")
        .and(warp::post())
        .and(warp::query::<PinFileQuery>())
        .and(warp::body::content_length_limit(MAX_UPLOAD_BYTES))
        .and(warp::body::bytes())
        .and(with_ctx(ctx.clone()))
        .and_then(pin_file_handler);

    let pin_metadata = warp::path!("api" / "pins" / "metadata")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_ctx(ctx.clone()))
        .and_then(pin_metadata_handler);

    let prepare_mint = warp::path!("api" / "transactions" / "mint")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_ctx(ctx.clone()))
        .and_then(prepare_mint_handler);

    let prepare_buy = warp::path!("api" / "transactions" / "buy")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_ctx(ctx))
        .and_then(prepare_buy_handler);

    let routes = health
        .or(metrics)
        .or(listings)
        .or(listing)
        .or(owner_listings)
        .or(pin_file)
        .or(pin_metadata)
        .or(prepare_mint)
        .or(prepare_buy);

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}

fn with_ctx(
    ctx: AppContext,
) -> impl Filter<Extract = (AppContext,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn error_reply(status: StatusCode, message: &str) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({ "error": message })),
        status,
    )
}

async fn health_handler(ctx: AppContext) -> Result<impl Reply, Infallible> {
    let status = ctx.health.get_status().await;
    Ok(warp::reply::json(&status))
}

async fn metrics_handler(ctx: AppContext) -> Result<impl Reply, Infallible> {
    Ok(ctx.metrics.export())
}

async fn listings_handler(ctx: AppContext) -> Result<WithStatus<Json>, Infallible> {
    match ctx.reconciler.build_all().await {
        Ok(listings) => Ok(warp::reply::with_status(
            warp::reply::json(&listings),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!("Failed to load marketplace listings: {}", e);
            Ok(error_reply(StatusCode::BAD_GATEWAY, CHAIN_UNAVAILABLE))
        }
    }
}

async fn listing_handler(token_id: u64, ctx: AppContext) -> Result<WithStatus<Json>, Infallible> {
    match ctx.contract.token_count().await {
        Ok(count) if token_id >= count => {
            return Ok(error_reply(StatusCode::NOT_FOUND, "Unknown token"));
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("Failed to read token counter: {}", e);
            return Ok(error_reply(StatusCode::BAD_GATEWAY, CHAIN_UNAVAILABLE));
        }
    }

    match ctx.reconciler.build_listing(token_id).await {
        Ok(listing) => Ok(warp::reply::with_status(
            warp::reply::json(&listing),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!("Failed to load NFT {}: {}", token_id, e);
            Ok(error_reply(StatusCode::BAD_GATEWAY, CHAIN_UNAVAILABLE))
        }
    }
}

async fn owner_listings_handler(
    owner: String,
    ctx: AppContext,
) -> Result<WithStatus<Json>, Infallible> {
    match ctx.reconciler.build_for_owner(&owner).await {
        Ok(listings) => Ok(warp::reply::with_status(
            warp::reply::json(&listings),
            StatusCode::OK,
        )),
        Err(ChainError::InvalidAddress(_)) => {
            Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid account address"))
        }
        Err(e) => {
            tracing::error!("Failed to load NFTs for {}: {}", owner, e);
            Ok(error_reply(StatusCode::BAD_GATEWAY, CHAIN_UNAVAILABLE))
        }
    }
}

async fn pin_file_handler(
    query: PinFileQuery,
    body: Bytes,
    ctx: AppContext,
) -> Result<WithStatus<Json>, Infallible> {
    ctx.metrics.pin_requests.inc();
    let filename = query.filename.as_deref().unwrap_or("upload");

    match ctx.pinning.pin_file(body.to_vec(), filename).await {
        Ok(receipt) => Ok(warp::reply::with_status(
            warp::reply::json(&receipt),
            StatusCode::CREATED,
        )),
        Err(e) => Ok(pin_error_reply(e)),
    }
}

async fn pin_metadata_handler(
    request: PinMetadataRequest,
    ctx: AppContext,
) -> Result<WithStatus<Json>, Infallible> {
    ctx.metrics.pin_requests.inc();
    let metadata = build_metadata(&request.name, &request.description, &request.image_cid);

    match ctx.pinning.pin_metadata(&metadata).await {
        Ok(receipt) => Ok(warp::reply::with_status(
            warp::reply::json(&receipt),
            StatusCode::CREATED,
        )),
        Err(e) => Ok(pin_error_reply(e)),
    }
}

fn pin_error_reply(error: PinError) -> WithStatus<Json> {
    match error {
        PinError::MissingCredentials => error_reply(
            StatusCode::SERVICE_UNAVAILABLE,
            "Pinning is not configured",
        ),
        other => {
            tracing::error!("Pinning failed: {}", other);
            error_reply(StatusCode::BAD_GATEWAY, "Failed to pin content")
        }
    }
}

async fn prepare_mint_handler(
    request: MintRequest,
    ctx: AppContext,
) -> Result<WithStatus<Json>, Infallible> {
    match parse_price(&request.price) {
        Ok(price) => {
            let prepared = ctx.contract.mint_call(&request.metadata_cid, price);
            Ok(warp::reply::with_status(
                warp::reply::json(&prepared),
                StatusCode::OK,
            ))
        }
        Err(_) => Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid price")),
    }
}

async fn prepare_buy_handler(
    request: BuyRequest,
    ctx: AppContext,
) -> Result<WithStatus<Json>, Infallible> {
    match parse_price(&request.price) {
        Ok(price) => {
            let prepared = ctx.contract.buy_call(request.token_id, price);
            Ok(warp::reply::with_status(
                warp::reply::json(&prepared),
                StatusCode::OK,
            ))
        }
        Err(_) => Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid price")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ChainConfig, IpfsConfig};
    use crate::ipfs::GatewayClient;
    use crate::chain::RpcClient;

    fn test_ctx() -> AppContext {
        let chain_config = ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: "0x2c87064a63bfd4b9ad347540b7da055e7f8ae23c".to_string(),
            chain_id: 161221135,
            request_timeout_secs: 1,
        };
        let ipfs_config = IpfsConfig {
            gateway_base_url: "https://ipfs.io".to_string(),
            pinning_base_url: "https://api.pinata.cloud".to_string(),
            pinning_jwt: String::new(),
            enrichment_timeout_secs: 1,
        };

        let rpc = Arc::new(RpcClient::new(&chain_config).unwrap());
        let contract = Arc::new(MarketplaceContract::new(rpc, &chain_config).unwrap());
        let gateway = Arc::new(GatewayClient::new(&ipfs_config).unwrap());
        let pinning = Arc::new(PinningClient::new(&ipfs_config).unwrap());
        let metrics = Arc::new(Metrics::new().unwrap());
        let reconciler = Arc::new(ListingReconciler::new(
            contract.clone(),
            gateway,
            ipfs_config.gateway_base_url.clone(),
            4,
            metrics.clone(),
        ));

        AppContext {
            reconciler,
            contract,
            pinning,
            health: Arc::new(HealthChecker::new()),
            metrics,
        }
    }

    #[tokio::test]
    async fn health_route_reports_status() {
        let ctx = test_ctx();
        let filter = warp::path!("health")
            .and(with_ctx(ctx))
            .and_then(health_handler);

        let response = warp::test::request().path("/health").reply(&filter).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn metrics_route_exports_counters() {
        let ctx = test_ctx();
        ctx.metrics.listings_built.inc();
        let filter = warp::path!("metrics")
            .and(with_ctx(ctx))
            .and_then(metrics_handler);

        let response = warp::test::request().path("/metrics").reply(&filter).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(body.contains("listings_built_total 1"));
    }

    #[tokio::test]
    async fn pin_file_without_credentials_is_unavailable() {
        let ctx = test_ctx();
        let filter = warp::path!("api" / "pins" / "file")
            .and(warp::post())
            .and(warp::query::<PinFileQuery>())
            .and(warp::body::bytes())
            .and(with_ctx(ctx))
            .and_then(pin_file_handler);

        let response = warp::test::request()
            .method("POST")
            .path("/api/pins/file?filename=cat.png")
            .body(vec![1, 2, 3])
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn prepare_mint_rejects_malformed_prices() {
        let ctx = test_ctx();
        let filter = warp::path!("api" / "transactions" / "mint")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_ctx(ctx))
            .and_then(prepare_mint_handler);

        let response = warp::test::request()
            .method("POST")
            .path("/api/transactions/mint")
            .json(&serde_json::json!({ "metadata_cid": "QmHash", "price": "not a price" }))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn prepare_buy_returns_signable_call() {
        let ctx = test_ctx();
        let filter = warp::path!("api" / "transactions" / "buy")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_ctx(ctx))
            .and_then(prepare_buy_handler);

        let response = warp::test::request()
            .method("POST")
            .path("/api/transactions/buy")
            .json(&serde_json::json!({ "token_id": 3, "price": "1.5" }))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["value"], "1500000000000000000");
        assert!(body["data"].as_str().unwrap().starts_with("0x"));
    }
}
