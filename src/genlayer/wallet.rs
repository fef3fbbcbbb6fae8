//! Wallet providers.
//!
//! A wallet is an opaque capability reached through `request`-style calls,
//! the same shape browser-injected providers expose. [`LocalWallet`] is the
//! in-process implementation backed by a private key.

use std::{borrow::Cow, sync::Arc};

use alloy::{
    eips::eip2718::Encodable2718,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, Result},
    genlayer::transport::HttpProvider,
};

/// A wallet reachable through request-style method calls.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Perform one wallet request (`eth_accounts`, `eth_sendTransaction`, ...).
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

/// Whether two handles point at the same provider instance.
pub fn same_provider(a: &Arc<dyn WalletProvider>, b: &Arc<dyn WalletProvider>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Parse a quantity from a wallet response: a `0x` hex string or a plain number.
pub fn parse_quantity(value: &Value) -> Result<u128> {
    match value {
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) if !hex.is_empty() => Ok(u128::from_str_radix(hex, 16)?),
            Some(_) => Ok(0),
            None => Ok(s.parse::<u128>()?),
        },
        Value::Number(n) => {
            n.as_u64().map(u128::from).ok_or_else(|| AppError::Parse(format!("Bad quantity {}", n)))
        }
        other => Err(AppError::Parse(format!("Expected quantity, got {}", other))),
    }
}

/// The `eth_sendTransaction` fields the local wallet honours.
#[derive(Debug, Deserialize)]
struct WalletTransaction {
    to: Address,
    #[serde(default)]
    data: Bytes,
    #[serde(default)]
    value: U256,
}

/// Private-key wallet that signs locally and broadcasts through the node.
#[derive(Clone)]
pub struct LocalWallet {
    /// The local signer.
    signer: PrivateKeySigner,
    /// Wallet address.
    address: Address,
    /// Chain the wallet signs for.
    chain_id: u64,
    /// Node used for nonces, gas and broadcasting.
    provider: HttpProvider,
}

impl LocalWallet {
    /// Create a wallet from a private key string.
    pub fn from_private_key(
        private_key: &str,
        chain_id: u64,
        provider: HttpProvider,
    ) -> Result<Self> {
        // Remove 0x prefix if present
        let key = private_key.strip_prefix("0x").unwrap_or(private_key);

        let signer: PrivateKeySigner = key.parse()?;
        let address = signer.address();

        tracing::info!(address = %address, chain_id, "Local wallet initialized");

        Ok(Self { signer, address, chain_id, provider })
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the chain the wallet signs for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn switch_chain(&self, params: &Value) -> Result<Value> {
        let requested = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .ok_or_else(|| AppError::Wallet("wallet_switchEthereumChain needs a chainId".into()))
            .and_then(parse_quantity)?;

        if requested != u128::from(self.chain_id) {
            return Err(AppError::Rpc(format!("Unrecognized chain ID {requested:#x}")));
        }
        Ok(Value::Null)
    }

    /// Sign `tx` locally and broadcast it. Returns the transaction hash.
    async fn send_transaction(&self, tx: &Value) -> Result<Value> {
        let tx: WalletTransaction = serde_json::from_value(tx.clone())?;

        let request = TransactionRequest::default()
            .with_from(self.address)
            .with_to(tx.to)
            .with_input(tx.data)
            .with_value(tx.value);

        let nonce = self.provider.get_transaction_count(self.address).pending().await?;
        let gas_price = self.provider.get_gas_price().await?;
        let gas_limit = self.provider.estimate_gas(request.clone()).await?;

        let request = request
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_gas_price(gas_price)
            .with_gas_limit(gas_limit);

        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope =
            request.build(&wallet).await.map_err(|e| AppError::Wallet(e.to_string()))?;

        tracing::debug!(to = %tx.to, nonce, "Broadcasting signed transaction");

        let pending = self.provider.send_raw_transaction(&envelope.encoded_2718()).await?;
        Ok(json!(pending.tx_hash()))
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => Ok(json!([self.address])),
            "eth_chainId" => Ok(json!(format!("{:#x}", self.chain_id))),
            "wallet_switchEthereumChain" => self.switch_chain(&params),
            "eth_sendTransaction" => {
                let tx = params
                    .get(0)
                    .ok_or_else(|| AppError::Wallet("eth_sendTransaction needs a transaction".into()))?;
                self.send_transaction(tx).await
            }
            // Read-only methods go straight to the node, as injected providers do
            _ => {
                let result: Value =
                    self.provider.raw_request(Cow::Owned(method.to_string()), params).await?;
                Ok(result)
            }
        }
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
