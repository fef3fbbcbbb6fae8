//! JSON-RPC transport.
//!
//! The node speaks JSON-RPC 2.0 over HTTP. Everything above this module sees
//! only [`RpcTransport`], so tests can substitute an in-memory node.

use std::borrow::Cow;

use alloy::{
    network::Ethereum,
    providers::{Provider, RootProvider},
    rpc::client::RpcClient,
    transports::http::Http,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{AppError, Result},
    genlayer::constants::RPC_TIMEOUT,
};

/// Type alias for the HTTP provider.
pub type HttpProvider = RootProvider<Ethereum>;

/// A request/response channel to a GenLayer node.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send one JSON-RPC call and return its `result`.
    ///
    /// # Errors
    /// JSON-RPC error objects come back as [`AppError::Rpc`] carrying the
    /// node's message verbatim.
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

/// JSON-RPC over HTTP through an alloy provider.
///
/// GenLayer-specific methods (`gen_call`, `sim_*`) go through
/// `raw_request`; the wallet uses the same provider for the typed `eth_*`
/// calls.
#[derive(Clone)]
pub struct HttpTransport {
    provider: HttpProvider,
    url: String,
}

impl HttpTransport {
    /// Create a transport for `url`.
    ///
    /// Note: no network call is made until the first request.
    pub fn new(url: &str) -> Result<Self> {
        let parsed: reqwest::Url =
            url.parse().map_err(|_| AppError::Config(format!("Invalid RPC URL: {}", url)))?;

        let http = reqwest::Client::builder().timeout(RPC_TIMEOUT).build()?;
        let client = RpcClient::new(Http::with_client(http, parsed), false);

        tracing::info!(rpc_url = %url, "JSON-RPC transport created (lazy initialization)");

        Ok(Self { provider: RootProvider::new(client), url: url.to_string() })
    }

    /// The endpoint this transport talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").field("url", &self.url).finish()
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        tracing::trace!(method, "JSON-RPC request");
        let result: Value =
            self.provider.raw_request(Cow::Owned(method.to_string()), params).await?;
        Ok(result)
    }
}
