use alloy_primitives::utils::format_units;
use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Decimal places of the marketplace's native pricing token. Canonical for
/// the whole service; every price formats and parses through this.
pub const PRICE_DECIMALS: u8 = 18;

/// Authoritative on-chain record of a minted token. Nothing downstream is
/// allowed to overwrite these fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub token_id: u64,
    pub owner: Address,
    pub content_id: String,
    pub price: U256,
}

/// An unsigned contract call, ready for an external wallet to sign and
/// submit. `value` is the native amount in wei, as a decimal string.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedCall {
    pub to: String,
    pub data: String,
    pub value: String,
}

/// Wei to a human display string, trailing zeros trimmed ("1.5", not
/// "1.500000000000000000").
pub fn format_price(price: U256) -> String {
    let formatted = format_units(price, PRICE_DECIMALS).unwrap_or_else(|_| "0.0".to_string());
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
