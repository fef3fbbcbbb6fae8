//! GenLayer contract client.

use std::{sync::Arc, time::Duration};

use alloy::{
    hex,
    primitives::{Address, B256, U256},
};
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::{
    error::{AppError, Result},
    genlayer::{
        calldata::{self, CalldataValue},
        consensus,
        constants::CONSENSUS_MAIN_CONTRACT,
        transport::RpcTransport,
        wallet::{same_provider, WalletProvider},
    },
    types::TransactionStatus,
};

/// A wallet bound to one account.
#[derive(Clone)]
pub struct Signer {
    pub provider: Arc<dyn WalletProvider>,
    pub address: Address,
}

/// Client configuration: chain, node and optional signer.
///
/// A client is immutable. Attaching a different signer produces a new client
/// (see [`ClientSession`](crate::genlayer::ClientSession)), which also resets
/// the one-time consensus initialization.
#[derive(Clone)]
pub struct CheckinClient {
    /// Node transport.
    transport: Arc<dyn RpcTransport>,
    /// Configured chain ID.
    chain_id: u64,
    /// Signing wallet, if one is attached.
    signer: Option<Signer>,
    /// Lazily fetched consensus-main contract address.
    consensus: Arc<OnceCell<Address>>,
}

impl CheckinClient {
    /// Create a read-only client.
    ///
    /// Note: This does NOT make any network calls.
    pub fn new(transport: Arc<dyn RpcTransport>, chain_id: u64) -> Self {
        tracing::info!(chain_id, "GenLayer client created (lazy initialization)");
        Self { transport, chain_id, signer: None, consensus: Arc::new(OnceCell::new()) }
    }

    /// A new client on the same node with `provider`/`address` as signer.
    pub fn with_signer(&self, provider: Arc<dyn WalletProvider>, address: Address) -> Self {
        Self {
            transport: self.transport.clone(),
            chain_id: self.chain_id,
            signer: Some(Signer { provider, address }),
            consensus: Arc::new(OnceCell::new()),
        }
    }

    /// A new read-only client on the same node.
    pub fn without_signer(&self) -> Self {
        Self::new(self.transport.clone(), self.chain_id)
    }

    /// Whether this client is bound to exactly `provider` and `address`.
    pub fn is_bound_to(&self, provider: &Arc<dyn WalletProvider>, address: Address) -> bool {
        self.signer
            .as_ref()
            .is_some_and(|s| s.address == address && same_provider(&s.provider, provider))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The attached account, if any.
    pub fn account(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address)
    }

    /// The attached wallet provider, if any.
    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.signer.as_ref().map(|s| &s.provider)
    }

    /// The node transport.
    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    /// Whether the consensus contract has been resolved for this client.
    pub fn is_consensus_initialized(&self) -> bool {
        self.consensus.initialized()
    }

    /// Resolve the consensus-main contract address (fetched on first call).
    pub async fn initialize_consensus_contract(&self) -> Result<Address> {
        self.consensus
            .get_or_try_init(|| async {
                let result = self
                    .transport
                    .request("sim_getConsensusContract", json!([CONSENSUS_MAIN_CONTRACT]))
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "Failed to initialize consensus contract");
                        e
                    })?;

                let raw = result
                    .get("address")
                    .and_then(Value::as_str)
                    .or_else(|| result.as_str())
                    .ok_or_else(|| {
                        AppError::Parse(format!("Consensus contract response has no address: {}", result))
                    })?;
                let address: Address = raw
                    .parse()
                    .map_err(|e| AppError::InvalidAddress(format!("{raw}: {e}")))?;

                tracing::info!(address = %address, "Consensus contract initialized");
                Ok(address)
            })
            .await
            .copied()
    }

    /// Call a view function of an intelligent contract.
    pub async fn read_contract(
        &self,
        address: Address,
        function: &str,
        args: Vec<CalldataValue>,
    ) -> Result<CalldataValue> {
        let data = calldata::encode(&CalldataValue::call(function, args));
        let from = self.account().unwrap_or(Address::ZERO);

        tracing::debug!(contract = %address, function, "Reading contract");

        let result = self
            .transport
            .request(
                "gen_call",
                json!([{
                    "type": "read",
                    "to": address,
                    "from": from,
                    "data": hex::encode_prefixed(&data),
                    "transaction_hash_variant": "latest-nonfinal",
                }]),
            )
            .await?;

        decode_read_result(&result)
    }

    /// Submit a write to an intelligent contract. Returns the transaction hash.
    ///
    /// # Errors
    /// [`AppError::NoSigner`] without an attached wallet; wallet and node
    /// rejections are passed through unchanged.
    pub async fn write_contract(
        &self,
        address: Address,
        function: &str,
        args: Vec<CalldataValue>,
        value: U256,
    ) -> Result<B256> {
        let signer = self.signer.as_ref().ok_or(AppError::NoSigner)?;
        let consensus = self.initialize_consensus_contract().await?;

        let payload = calldata::encode(&CalldataValue::call(function, args));
        let data = consensus::encode_add_transaction(signer.address, address, payload);

        tracing::info!(contract = %address, function, from = %signer.address, "Submitting transaction");

        let result = signer
            .provider
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": signer.address,
                    "to": consensus,
                    "data": data,
                    "value": format!("{value:#x}"),
                }]),
            )
            .await?;

        let raw = result
            .as_str()
            .ok_or_else(|| AppError::Parse(format!("Expected transaction hash, got {}", result)))?;
        raw.parse::<B256>().map_err(|e| AppError::Parse(format!("Bad transaction hash {raw}: {e}")))
    }

    /// Fetch a transaction by hash; `None` while the node does not know it.
    pub async fn get_transaction(&self, hash: B256) -> Result<Option<Value>> {
        let result = self.transport.request("eth_getTransactionByHash", json!([hash])).await?;
        Ok((!result.is_null()).then_some(result))
    }

    /// Poll until the transaction reaches `status`.
    ///
    /// Polls at most `retries` times, `interval` apart. A wait for
    /// [`TransactionStatus::Accepted`] is also satisfied by a finalized
    /// transaction.
    pub async fn wait_for_transaction_receipt(
        &self,
        hash: B256,
        status: TransactionStatus,
        retries: u32,
        interval: Duration,
    ) -> Result<Value> {
        for attempt in 1..=retries {
            if let Some(tx) = self.get_transaction(hash).await? {
                let current = transaction_status(&tx);
                tracing::trace!(hash = %hash, attempt, status = ?current, "Polled transaction");
                if current.is_some_and(|s| s.satisfies(status)) {
                    return Ok(tx);
                }
            }
            if attempt < retries {
                tokio::time::sleep(interval).await;
            }
        }

        Err(AppError::PendingTransaction(format!(
            "Transaction {hash} did not reach {status} after {retries} attempts"
        )))
    }
}

impl std::fmt::Debug for CheckinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckinClient")
            .field("chain_id", &self.chain_id)
            .field("account", &self.account())
            .field("consensus", &self.consensus.get())
            .finish()
    }
}

/// Status of a transaction object (`statusName` preferred over `status`).
pub fn transaction_status(tx: &Value) -> Option<TransactionStatus> {
    tx.get("statusName")
        .and_then(TransactionStatus::from_json)
        .or_else(|| tx.get("status").and_then(TransactionStatus::from_json))
}

/// Decode a `gen_call` result.
///
/// Nodes answer with hex calldata (with or without `0x`); some answer with
/// plain JSON, which is taken as-is.
pub fn decode_read_result(result: &Value) -> Result<CalldataValue> {
    match result {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            if digits.is_empty() {
                Ok(CalldataValue::Null)
            } else if digits.len() % 2 == 0 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
                calldata::decode_hex(digits)
            } else {
                Ok(CalldataValue::Str(s.clone()))
            }
        }
        other => Ok(CalldataValue::from(other)),
    }
}
