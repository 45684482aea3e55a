use thiserror::Error;

/// Failure of the authoritative chain read path. Callers must treat any of
/// these as "no listing" rather than render partial data.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC endpoint returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("JSON-RPC response carried neither result nor error")]
    EmptyResult,

    #[error("invalid hex quantity: {0}")]
    InvalidQuantity(String),

    #[error("ABI decode failed: {0}")]
    AbiDecode(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),
}
