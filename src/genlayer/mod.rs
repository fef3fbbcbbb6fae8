//! GenLayer interaction module.
//!
//! Contains the JSON-RPC transport, calldata codec, contract client, wallet
//! providers and the client session.

pub mod calldata;
pub mod client;
pub mod consensus;
pub mod constants;
pub mod session;
pub mod transport;
pub mod wallet;

pub use calldata::CalldataValue;
pub use client::CheckinClient;
pub use session::ClientSession;
pub use transport::{HttpProvider, HttpTransport, RpcTransport};
pub use wallet::{LocalWallet, WalletProvider};
