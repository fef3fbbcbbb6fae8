//! Configuration management module.
//!
//! Handles loading configuration from environment variables.

use std::{env, time::Duration};

use alloy::primitives::Address;

use crate::{
    error::AppError,
    genlayer::constants::{
        DEFAULT_CONTRACT_ADDRESS, DEFAULT_FINALIZE_INTERVAL, DEFAULT_FINALIZE_RETRIES,
        DEFAULT_RPC_URL, STUDIONET_CHAIN_ID,
    },
};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// GenLayer JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Chain the client and wallet must agree on.
    pub chain_id: u64,
    /// Check-in contract address (the fallback when the configured one is invalid).
    pub contract_address: Address,
    /// Whether `contract_address` came from a well-formed configured value.
    pub has_valid_contract_address: bool,
    /// Optional private key for the local wallet (hex string with 0x prefix).
    pub private_key: Option<String>,
    /// How many times to poll for finalization after a check-in.
    pub finalize_retries: u32,
    /// Fixed delay between finalization polls.
    pub finalize_interval: Duration,
    /// Logging level (default: info).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `GENLAYER_RPC_URL`: JSON-RPC endpoint (default: StudioNet)
    /// - `GENLAYER_CHAIN_ID`: chain ID (default: 61999)
    /// - `CHECKIN_CONTRACT_ADDRESS`: check-in contract address
    /// - `GENLAYER_PRIVATE_KEY`: private key for the local wallet
    /// - `FINALIZE_RETRIES`: finalization poll count (default: 100)
    /// - `FINALIZE_INTERVAL_MS`: finalization poll interval (default: 3000)
    /// - `LOG_LEVEL`: Logging level (default: info)
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let rpc_url = env::var("GENLAYER_RPC_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let chain_id = parse_var("GENLAYER_CHAIN_ID", STUDIONET_CHAIN_ID)?;

        let (contract_address, has_valid_contract_address) =
            resolve_contract_address(env::var("CHECKIN_CONTRACT_ADDRESS").ok().as_deref());

        let private_key =
            env::var("GENLAYER_PRIVATE_KEY").ok().filter(|s| !s.trim().is_empty());

        let finalize_retries = parse_var("FINALIZE_RETRIES", DEFAULT_FINALIZE_RETRIES)?;
        let finalize_interval = Duration::from_millis(parse_var(
            "FINALIZE_INTERVAL_MS",
            DEFAULT_FINALIZE_INTERVAL.as_millis() as u64,
        )?);

        let log_level = log_level_from_env();

        Ok(Self {
            rpc_url,
            chain_id,
            contract_address,
            has_valid_contract_address,
            private_key,
            finalize_retries,
            finalize_interval,
            log_level,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: STUDIONET_CHAIN_ID,
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            has_valid_contract_address: true,
            private_key: None,
            finalize_retries: DEFAULT_FINALIZE_RETRIES,
            finalize_interval: DEFAULT_FINALIZE_INTERVAL,
            log_level: "info".to_string(),
        }
    }
}

/// `LOG_LEVEL`, or `info` when unset or blank.
///
/// Readable before [`Config::from_env`] so logging can be up while the rest
/// of the configuration loads.
pub fn log_level_from_env() -> String {
    log_level_or_default(env::var("LOG_LEVEL").ok())
}

fn log_level_or_default(raw: Option<String>) -> String {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Whether `s` is `0x` followed by exactly 40 hex digits.
pub fn is_valid_address_literal(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Resolve the configured contract address.
///
/// An unset value means the default deployment. A set but malformed value
/// falls back to the default deployment, is reported as invalid and logs a
/// warning.
pub fn resolve_contract_address(raw: Option<&str>) -> (Address, bool) {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return (DEFAULT_CONTRACT_ADDRESS, true);
    };

    if is_valid_address_literal(raw) {
        if let Ok(address) = raw.parse::<Address>() {
            return (address, true);
        }
    }

    tracing::warn!(
        configured = %raw,
        fallback = %DEFAULT_CONTRACT_ADDRESS,
        "Contract address is invalid, using default"
    );
    (DEFAULT_CONTRACT_ADDRESS, false)
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{name} must be a number, got '{value}'"))),
        _ => Ok(default),
    }
}
