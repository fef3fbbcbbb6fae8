//! Common utilities for integration tests.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use alloy::{hex, primitives::Address};
use async_trait::async_trait;
use serde_json::{json, Value};

use gendaily_checkin::{
    genlayer::{
        calldata::{self, CalldataValue},
        CheckinClient, ClientSession, RpcTransport, WalletProvider,
    },
    AppError, CheckinServer, Config, Result, DEFAULT_CONTRACT_ADDRESS, STUDIONET_CHAIN_ID,
};

pub const CONSENSUS_ADDRESS: &str = "0xb7278A61aa25c888815aFC32Ad3cC52fF24fE575";
pub const TX_HASH: &str = "0xabababababababababababababababababababababababababababababababab";

// ============================================================================
// Mock node
// ============================================================================

/// In-memory GenLayer node.
///
/// `gen_call` answers come from per-function scripts; a function can be told
/// to fail a number of times first. Transaction lookups are served from a
/// queue of status objects, repeating the last one.
#[derive(Default)]
pub struct MockNode {
    calls: Mutex<Vec<(String, Value)>>,
    reads: Mutex<HashMap<String, CalldataValue>>,
    failures: Mutex<HashMap<String, usize>>,
    tx_statuses: Mutex<Vec<Value>>,
}

impl MockNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `function` with `value`.
    pub fn on_read(&self, function: &str, value: impl Into<CalldataValue>) {
        self.reads.lock().unwrap().insert(function.to_string(), value.into());
    }

    /// Make the next `times` reads of `function` fail.
    pub fn fail_reads(&self, function: &str, times: usize) {
        self.failures.lock().unwrap().insert(function.to_string(), times);
    }

    /// Queue transaction status objects for `eth_getTransactionByHash`.
    pub fn push_tx_status(&self, status: Value) {
        self.tx_statuses.lock().unwrap().push(status);
    }

    /// Number of requests of `method`.
    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(m, _)| m == method).count()
    }

    /// Number of `gen_call` reads of `function`.
    pub fn reads_of(&self, function: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, params)| m == "gen_call" && read_function(params).as_deref() == Some(function))
            .count()
    }

    /// `from` address of every `gen_call`, in order.
    pub fn read_senders(&self) -> Vec<Option<Address>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == "gen_call")
            .map(|(_, params)| params[0]["from"].as_str().and_then(|s| s.parse().ok()))
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// A node preloaded with a connected account's usual answers.
    pub fn with_checkin_state() -> Arc<Self> {
        let node = Self::new();
        node.on_read("get_my_stats", r#"{"last_day": 20100, "streak": 3, "total": 12, "total_score": 240}"#);
        node.on_read("is_checked_today", true);
        node.on_read("current_day_index", 20100i64);
        node.on_read(
            "get_day_range_counts",
            CalldataValue::Array([4i64, 0, 2, 5, 7, 9, 11].map(CalldataValue::from).to_vec()),
        );
        node.on_read("next_reset_time", 1_736_726_400i64);
        node
    }

    fn gen_call(&self, params: &Value) -> Result<Value> {
        let function = read_function(params)
            .ok_or_else(|| AppError::Rpc("gen_call without a method".into()))?;

        if let Some(left) = self.failures.lock().unwrap().get_mut(&function) {
            if *left > 0 {
                *left -= 1;
                return Err(AppError::Rpc(format!("{function} temporarily unavailable")));
            }
        }

        let reads = self.reads.lock().unwrap();
        let value = reads
            .get(&function)
            .ok_or_else(|| AppError::Rpc(format!("no script for {function}")))?;
        Ok(json!(hex::encode_prefixed(calldata::encode(value))))
    }
}

/// Contract function named in a `gen_call` request.
fn read_function(params: &Value) -> Option<String> {
    let data = params.get(0)?.get("data")?.as_str()?;
    let call = calldata::decode_hex(data).ok()?;
    match call.as_map()?.get("method")? {
        CalldataValue::Str(name) => Some(name.clone()),
        _ => None,
    }
}

#[async_trait]
impl RpcTransport for MockNode {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.calls.lock().unwrap().push((method.to_string(), params.clone()));
        match method {
            "gen_call" => self.gen_call(&params),
            "sim_getConsensusContract" => Ok(json!({ "address": CONSENSUS_ADDRESS, "abi": [] })),
            "eth_getTransactionByHash" => {
                let mut statuses = self.tx_statuses.lock().unwrap();
                match statuses.len() {
                    0 => Ok(Value::Null),
                    1 => Ok(statuses[0].clone()),
                    _ => Ok(statuses.remove(0)),
                }
            }
            _ => Err(AppError::Rpc(format!("method {method} not supported"))),
        }
    }
}

// ============================================================================
// Mock wallet
// ============================================================================

/// Wallet that records submissions instead of signing.
pub struct MockWallet {
    pub address: Address,
    chain_id: Mutex<u64>,
    sends: AtomicUsize,
    send_error: Mutex<Option<String>>,
    switch_allowed: bool,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        Self::on_chain(STUDIONET_CHAIN_ID, true)
    }

    pub fn on_chain(chain_id: u64, switch_allowed: bool) -> Arc<Self> {
        Arc::new(Self {
            address: Address::repeat_byte(0x11),
            chain_id: Mutex::new(chain_id),
            sends: AtomicUsize::new(0),
            send_error: Mutex::new(None),
            switch_allowed,
        })
    }

    /// A wallet holding `address` instead of the default account.
    pub fn at(address: Address) -> Arc<Self> {
        Arc::new(Self {
            address,
            chain_id: Mutex::new(STUDIONET_CHAIN_ID),
            sends: AtomicUsize::new(0),
            send_error: Mutex::new(None),
            switch_allowed: true,
        })
    }

    /// Reject every `eth_sendTransaction` with `message`.
    pub fn reject_sends(&self, message: &str) {
        *self.send_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn accept_sends(&self) {
        *self.send_error.lock().unwrap() = None;
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn chain_id(&self) -> u64 {
        *self.chain_id.lock().unwrap()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => Ok(json!([self.address])),
            "eth_chainId" => Ok(json!(format!("{:#x}", self.chain_id()))),
            "wallet_switchEthereumChain" => {
                if !self.switch_allowed {
                    return Err(AppError::Wallet("User rejected the request.".into()));
                }
                let requested = params[0]["chainId"].as_str().unwrap_or_default();
                let id = u64::from_str_radix(requested.trim_start_matches("0x"), 16)
                    .map_err(|e| AppError::Wallet(e.to_string()))?;
                *self.chain_id.lock().unwrap() = id;
                Ok(Value::Null)
            }
            "eth_sendTransaction" => {
                self.sends.fetch_add(1, Ordering::SeqCst);
                match self.send_error.lock().unwrap().clone() {
                    Some(message) => Err(AppError::Rpc(message)),
                    None => Ok(json!(TX_HASH)),
                }
            }
            _ => Err(AppError::Wallet(format!("method {method} not supported"))),
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Configuration with fast finalization polling.
pub fn test_config() -> Config {
    Config {
        finalize_retries: 5,
        finalize_interval: Duration::from_millis(5),
        log_level: "warn".to_string(),
        ..Config::default()
    }
}

/// Read-only session on `node`.
pub fn session(node: Arc<MockNode>) -> Arc<ClientSession> {
    Arc::new(ClientSession::new(CheckinClient::new(node, STUDIONET_CHAIN_ID)))
}

/// Session on `node` with `wallet` attached.
pub fn connected_session(node: Arc<MockNode>, wallet: Arc<MockWallet>) -> Arc<ClientSession> {
    let address = wallet.address;
    let client = CheckinClient::new(node, STUDIONET_CHAIN_ID).with_signer(wallet, address);
    Arc::new(ClientSession::new(client))
}

/// Session on any transport with `wallet` attached.
pub fn connected_session_on(
    transport: Arc<dyn RpcTransport>,
    wallet: Arc<MockWallet>,
) -> Arc<ClientSession> {
    let address = wallet.address;
    let client = CheckinClient::new(transport, STUDIONET_CHAIN_ID).with_signer(wallet, address);
    Arc::new(ClientSession::new(client))
}

pub fn contract_address() -> Address {
    DEFAULT_CONTRACT_ADDRESS
}

/// Helper to create a live test server from environment variables.
pub fn create_test_server() -> Option<CheckinServer> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let rpc_url = std::env::var("GENLAYER_RPC_URL").ok()?;
    if rpc_url.is_empty() {
        return None;
    }

    let config = Config::from_env().ok()?;
    CheckinServer::new(config).ok()
}

/// Skip test if server cannot be created (missing env vars).
#[macro_export]
macro_rules! skip_if_no_server {
    () => {
        match common::create_test_server() {
            Some(server) => server,
            None => {
                eprintln!("Skipping test: GENLAYER_RPC_URL not set");
                return;
            }
        }
    };
}
