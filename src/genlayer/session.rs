//! Client session: the current client and signer attachment.

use std::sync::Arc;

use alloy::primitives::Address;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::{
    error::{AppError, Result},
    genlayer::{
        client::CheckinClient,
        wallet::{parse_quantity, WalletProvider},
    },
};

/// Holds the client every operation should use.
///
/// Operations take an `Arc` snapshot with [`current`](Self::current) and run
/// against it to completion; attaching a signer swaps in a new client but never
/// touches snapshots already handed out.
pub struct ClientSession {
    current: RwLock<Arc<CheckinClient>>,
}

impl ClientSession {
    pub fn new(client: CheckinClient) -> Self {
        Self { current: RwLock::new(Arc::new(client)) }
    }

    /// The current client.
    pub async fn current(&self) -> Arc<CheckinClient> {
        self.current.read().await.clone()
    }

    /// Bind `provider`/`address` as the signer.
    ///
    /// Re-attaching the pair that is already bound returns the current client
    /// unchanged, so its consensus initialization is not repeated.
    pub async fn attach_signer(
        &self,
        provider: Arc<dyn WalletProvider>,
        address: Address,
    ) -> Arc<CheckinClient> {
        let mut current = self.current.write().await;
        if current.is_bound_to(&provider, address) {
            tracing::debug!(address = %address, "Signer already attached");
            return current.clone();
        }

        let next = Arc::new(current.with_signer(provider, address));
        *current = next.clone();
        tracing::info!(address = %address, "Signer attached");
        next
    }

    /// Ask `provider` for its accounts and attach the first one.
    pub async fn connect(&self, provider: Arc<dyn WalletProvider>) -> Result<Address> {
        let accounts = provider.request("eth_requestAccounts", json!([])).await?;
        let address = accounts
            .get(0)
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Wallet("Wallet returned no accounts".into()))?
            .parse::<Address>()
            .map_err(|e| AppError::InvalidAddress(e.to_string()))?;

        self.attach_signer(provider, address).await;
        Ok(address)
    }

    /// Drop the signer (wallet disconnected).
    pub async fn detach_signer(&self) -> Arc<CheckinClient> {
        let mut current = self.current.write().await;
        if current.account().is_some() {
            *current = Arc::new(current.without_signer());
            tracing::info!("Signer detached");
        }
        current.clone()
    }

    /// Make sure the wallet is on the configured chain.
    ///
    /// Returns whether the wallet ends up on the right chain. A failed switch is
    /// logged and reported as `false` so the caller can show guidance.
    pub async fn ensure_chain(&self) -> bool {
        let client = self.current().await;
        let Some(provider) = client.provider() else {
            return false;
        };
        let expected = client.chain_id();

        let actual = match provider.request("eth_chainId", json!([])).await {
            Ok(value) => parse_quantity(&value),
            Err(e) => Err(e),
        };

        match actual {
            Ok(id) if id == u128::from(expected) => true,
            Ok(id) => {
                tracing::warn!(expected, actual = %id, "Wallet is on another chain, requesting switch");
                let params = json!([{ "chainId": format!("{expected:#x}") }]);
                match provider.request("wallet_switchEthereumChain", params).await {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!(error = %e, "Chain switch failed");
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not read wallet chain");
                false
            }
        }
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession").finish_non_exhaustive()
    }
}
