//! Error types and handling module.
//!
//! Defines all application-specific error types and conversions.

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON-RPC errors returned by the node or the wallet.
    #[error("{0}")]
    Rpc(String),

    /// Transport errors.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Wallet-related errors.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// A write was attempted on a client without a signer.
    #[error("No signer attached; connect a wallet first")]
    NoSigner,

    /// The contract address is missing or malformed.
    #[error("Contract address is not set")]
    NotConfigured,

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed GenLayer calldata.
    #[error("Calldata error: {0}")]
    Calldata(String),

    /// Numeric overflow during conversion.
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    /// Input rejected before reaching the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pending transaction error.
    #[error("Pending transaction error: {0}")]
    PendingTransaction(String),
}

impl From<alloy::transports::TransportError> for AppError {
    fn from(err: alloy::transports::TransportError) -> Self {
        match err {
            // Node rejections keep the node's own message
            alloy::transports::RpcError::ErrorResp(payload) => {
                AppError::Rpc(payload.message.to_string())
            }
            other => AppError::Transport(other.to_string()),
        }
    }
}

impl From<alloy::signers::local::LocalSignerError> for AppError {
    fn from(err: alloy::signers::local::LocalSignerError) -> Self {
        AppError::Wallet(err.to_string())
    }
}

impl From<alloy::hex::FromHexError> for AppError {
    fn from(err: alloy::hex::FromHexError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidAddress(_)
            | AppError::Parse(_)
            | AppError::Validation(_)
            | AppError::NumericOverflow(_) => McpError::invalid_params(err.to_string(), None),
            AppError::Config(_) | AppError::NotConfigured | AppError::NoSigner => {
                McpError::invalid_request(err.to_string(), None)
            }
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
