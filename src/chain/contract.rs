use alloy_primitives::utils::parse_units;
use alloy_primitives::{hex, Address, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config::ChainConfig;

use super::error::ChainError;
use super::rpc::RpcClient;
use super::types::{PreparedCall, TokenRecord, PRICE_DECIMALS};

sol! {
    function tokenCounter() external view returns (uint256);
    function getNFTDetails(uint256 tokenId) external view returns (address owner, string memory cid, uint256 price);
    function getMyNFTs() external view returns (uint256[] memory);
    function mint(string memory tokenURI, uint256 price) external;
    function buy(uint256 tokenId) external payable;
}

/// Read-side view of the marketplace contract. The reconciler only ever
/// talks to this seam, so tests can substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Count of tokens minted so far; valid ids are `0..count`.
    async fn token_count(&self) -> Result<u64, ChainError>;

    /// Authoritative record for one token. Not retried; any failure means
    /// the caller has no listing for this id.
    async fn token_record(&self, token_id: u64) -> Result<TokenRecord, ChainError>;

    /// Token ids held by `owner` (the contract reads `msg.sender`).
    async fn tokens_of(&self, owner: &str) -> Result<Vec<u64>, ChainError>;
}

pub struct MarketplaceContract {
    rpc: Arc<RpcClient>,
    address: Address,
}

impl MarketplaceContract {
    pub fn new(rpc: Arc<RpcClient>, config: &ChainConfig) -> Result<Self, ChainError> {
        let address = config
            .contract_address
            .parse::<Address>()
            .map_err(|_| ChainError::InvalidAddress(config.contract_address.clone()))?;

        Ok(Self { rpc, address })
    }

    async fn view(&self, from: Option<&str>, calldata: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        let data = format!("0x{}", hex::encode(calldata));
        let result = self
            .rpc
            .eth_call(&self.address.to_string(), from, &data)
            .await?;
        hex::decode(&result).map_err(|e| ChainError::AbiDecode(e.to_string()))
    }

    pub async fn ping(&self) -> bool {
        self.rpc.block_number().await.is_ok()
    }

    /// Confirms the RPC endpoint serves the configured chain.
    pub async fn verify_chain_id(&self, expected: u64) -> Result<bool, ChainError> {
        Ok(self.rpc.chain_id().await? == expected)
    }

    /// Calldata for `mint(tokenURI, price)`. The token URI is the bare
    /// metadata content id, matching what the reconciler later reads back.
    pub fn mint_call(&self, metadata_cid: &str, price: U256) -> PreparedCall {
        let call = mintCall {
            tokenURI: metadata_cid.to_string(),
            price,
        };
        PreparedCall {
            to: self.address.to_string(),
            data: format!("0x{}", hex::encode(call.abi_encode())),
            value: "0".to_string(),
        }
    }

    /// Calldata for `buy(tokenId)`, carrying the asking price as value.
    pub fn buy_call(&self, token_id: u64, price: U256) -> PreparedCall {
        let call = buyCall {
            tokenId: U256::from(token_id),
        };
        PreparedCall {
            to: self.address.to_string(),
            data: format!("0x{}", hex::encode(call.abi_encode())),
            value: price.to_string(),
        }
    }
}

#[async_trait]
impl ChainReader for MarketplaceContract {
    async fn token_count(&self) -> Result<u64, ChainError> {
        let bytes = self.view(None, tokenCounterCall {}.abi_encode()).await?;
        let count = tokenCounterCall::abi_decode_returns(&bytes)
            .map_err(|e| ChainError::AbiDecode(e.to_string()))?;
        u64::try_from(count).map_err(|_| ChainError::AbiDecode("token counter out of range".into()))
    }

    async fn token_record(&self, token_id: u64) -> Result<TokenRecord, ChainError> {
        let call = getNFTDetailsCall {
            tokenId: U256::from(token_id),
        };
        let bytes = self.view(None, call.abi_encode()).await?;
        let details = getNFTDetailsCall::abi_decode_returns(&bytes)
            .map_err(|e| ChainError::AbiDecode(e.to_string()))?;

        Ok(TokenRecord {
            token_id,
            owner: details.owner,
            content_id: details.cid,
            price: details.price,
        })
    }

    async fn tokens_of(&self, owner: &str) -> Result<Vec<u64>, ChainError> {
        let from = owner
            .parse::<Address>()
            .map_err(|_| ChainError::InvalidAddress(owner.to_string()))?;

        let bytes = self
            .view(Some(&from.to_string()), getMyNFTsCall {}.abi_encode())
            .await?;
        let ids = getMyNFTsCall::abi_decode_returns(&bytes)
            .map_err(|e| ChainError::AbiDecode(e.to_string()))?;

        ids.into_iter()
            .map(|id| {
                u64::try_from(id)
                    .map_err(|_| ChainError::AbiDecode("token id out of range".into()))
            })
            .collect()
    }
}

/// Parses a user-facing decimal price ("1.5") into wei.
pub fn parse_price(price: &str) -> Result<U256, ChainError> {
    parse_units(price, PRICE_DECIMALS)
        .map(|parsed| parsed.get_absolute())
        .map_err(|_| ChainError::InvalidPrice(price.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_calldata_starts_with_selector_and_targets_contract() {
        let config = ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: "0x2c87064a63bfd4b9ad347540b7da055e7f8ae23c".to_string(),
            chain_id: 161221135,
            request_timeout_secs: 30,
        };
        let rpc = Arc::new(RpcClient::new(&config).unwrap());
        let contract = MarketplaceContract::new(rpc, &config).unwrap();

        let prepared = contract.mint_call("QmMetadataHash", parse_price("1.5").unwrap());
        let selector = hex::encode(mintCall::SELECTOR);
        assert!(prepared.data.starts_with(&format!("0x{}", selector)));
        assert_eq!(
            prepared.to.to_lowercase(),
            "0x2c87064a63bfd4b9ad347540b7da055e7f8ae23c"
        );
        assert_eq!(prepared.value, "0");
    }

    #[test]
    fn buy_calldata_carries_price_as_value() {
        let config = ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: "0x2c87064a63bfd4b9ad347540b7da055e7f8ae23c".to_string(),
            chain_id: 161221135,
            request_timeout_secs: 30,
        };
        let rpc = Arc::new(RpcClient::new(&config).unwrap());
        let contract = MarketplaceContract::new(rpc, &config).unwrap();

        let prepared = contract.buy_call(7, parse_price("2").unwrap());
        assert_eq!(prepared.value, "2000000000000000000");

        let decoded = buyCall::abi_decode(&hex::decode(&prepared.data).unwrap()).unwrap();
        assert_eq!(decoded.tokenId, U256::from(7u64));
    }

    #[test]
    fn rejects_bad_contract_address() {
        let config = ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: "not-an-address".to_string(),
            chain_id: 161221135,
            request_timeout_secs: 30,
        };
        let rpc = Arc::new(RpcClient::new(&config).unwrap());
        assert!(matches!(
            MarketplaceContract::new(rpc, &config),
            Err(ChainError::InvalidAddress(_))
        ));
    }

    #[test]
    fn parses_decimal_prices_to_wei() {
        assert_eq!(
            parse_price("1.5").unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_price("0").unwrap(), U256::ZERO);
        assert!(matches!(
            parse_price("one point five"),
            Err(ChainError::InvalidPrice(_))
        ));
    }
}
