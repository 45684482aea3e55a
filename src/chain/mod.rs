pub mod contract;
pub mod error;
pub mod rpc;
pub mod types;

pub use contract::{parse_price, ChainReader, MarketplaceContract};
pub use error::ChainError;
pub use rpc::RpcClient;
pub use types::{format_price, PreparedCall, TokenRecord, PRICE_DECIMALS};

#[cfg(test)]
pub use contract::MockChainReader;
