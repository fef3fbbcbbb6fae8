//! The check-in action.
//!
//! One attempt moves `Idle → Submitting → Accepted → Finalized`, or
//! `Idle → Submitting → Failed` when the submission is rejected. Acceptance is
//! reported as soon as the node hands back a transaction hash; finalization is
//! awaited in the background, after which the dependent queries are
//! invalidated.

use std::{sync::Arc, time::Duration};

use alloy::primitives::B256;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::Config,
    error::{AppError, Result},
    genlayer::{constants::MAX_CONTENT_CHARS, CheckinClient, ClientSession},
    services::{
        checkin::CheckinContract,
        queries::{QueryCache, QueryKind},
    },
    types::{CheckinState, TransactionStatus},
};

/// Reject content the contract would not accept.
pub fn validate_content(content: &str) -> Result<()> {
    let chars = content.chars().count();
    if chars > MAX_CONTENT_CHARS {
        return Err(AppError::Validation(format!(
            "Content is {chars} characters; the limit is {MAX_CONTENT_CHARS}"
        )));
    }
    Ok(())
}

/// A submitted check-in whose finalization is still being awaited.
#[derive(Debug)]
pub struct PendingCheckin {
    /// Transaction hash of the submission.
    pub hash: B256,
    finalization: JoinHandle<bool>,
}

impl PendingCheckin {
    /// Wait for the background finalization wait to end.
    ///
    /// Returns whether the transaction was seen finalized. A timeout or a
    /// polling error yields `false`; neither is reported as an error.
    pub async fn finalized(self) -> bool {
        self.finalization.await.unwrap_or(false)
    }
}

/// Submits check-ins and tracks the state of the latest attempt.
pub struct CheckinAction {
    session: Arc<ClientSession>,
    contract: CheckinContract,
    cache: Arc<QueryCache>,
    finalize_retries: u32,
    finalize_interval: Duration,
    state: Arc<watch::Sender<CheckinState>>,
}

impl CheckinAction {
    pub fn new(
        session: Arc<ClientSession>,
        contract: CheckinContract,
        cache: Arc<QueryCache>,
        finalize_retries: u32,
        finalize_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(CheckinState::Idle);
        Self {
            session,
            contract,
            cache,
            finalize_retries,
            finalize_interval,
            state: Arc::new(state),
        }
    }

    pub fn from_config(
        config: &Config,
        session: Arc<ClientSession>,
        cache: Arc<QueryCache>,
    ) -> Self {
        Self::new(
            session,
            CheckinContract::from_config(config),
            cache,
            config.finalize_retries,
            config.finalize_interval,
        )
    }

    /// State of the latest attempt.
    pub fn state(&self) -> CheckinState {
        self.state.borrow().clone()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CheckinState> {
        self.state.subscribe()
    }

    /// Submit a check-in carrying `content` (may be empty).
    ///
    /// Returns once the transaction is accepted. Content over the length limit
    /// is rejected before anything is sent, and only one submission may be in
    /// flight at a time. Submission errors are returned unchanged and leave
    /// the state `Failed`; a failed submission is never retried.
    pub async fn submit(&self, content: &str) -> Result<PendingCheckin> {
        validate_content(content)?;

        let started = self.state.send_if_modified(|state| {
            if state.can_submit() {
                *state = CheckinState::Submitting;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(AppError::Validation("A check-in is already being submitted".into()));
        }

        let client = self.session.current().await;
        let hash = match self.contract.checkin_sentence(&client, content).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(error = %e, "Check-in submission failed");
                self.state.send_replace(CheckinState::Failed(e.to_string()));
                return Err(e);
            }
        };

        tracing::info!(hash = %hash, "Check-in accepted, waiting for finalization");
        self.state.send_replace(CheckinState::Accepted(hash));

        let finalization = tokio::spawn(await_finalization(
            client,
            hash,
            self.finalize_retries,
            self.finalize_interval,
            self.cache.clone(),
            self.state.clone(),
        ));

        Ok(PendingCheckin { hash, finalization })
    }
}

async fn await_finalization(
    client: Arc<CheckinClient>,
    hash: B256,
    retries: u32,
    interval: Duration,
    cache: Arc<QueryCache>,
    state: Arc<watch::Sender<CheckinState>>,
) -> bool {
    match client
        .wait_for_transaction_receipt(hash, TransactionStatus::Finalized, retries, interval)
        .await
    {
        Ok(_) => {
            for kind in QueryKind::ALL {
                cache.invalidate(kind).await;
            }
            // Only promote this attempt; a newer attempt owns the state otherwise
            let promoted = state.send_if_modified(|s| {
                if *s == CheckinState::Accepted(hash) {
                    *s = CheckinState::Finalized(hash);
                    true
                } else {
                    false
                }
            });
            if promoted {
                tracing::info!(hash = %hash, "Check-in finalized");
            } else {
                tracing::debug!(hash = %hash, "Check-in finalized after a newer attempt started");
            }
            true
        }
        Err(e) => {
            // Not surfaced: the check-in stays reported as accepted
            tracing::warn!(hash = %hash, error = %e, "Gave up waiting for finalization");
            false
        }
    }
}
