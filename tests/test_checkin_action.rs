//! Integration tests for the check-in action.
//!
//! Run with: `cargo test --test test_checkin_action`

mod common;

use std::{sync::Arc, time::Duration};

use alloy::primitives::B256;
use common::{MockNode, MockWallet, TX_HASH};
use gendaily_checkin::{
    genlayer::ClientSession,
    services::{CheckinAction, CheckinContract, CheckinQueries, QueryCache},
    types::CheckinState,
    AppError,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

struct Harness {
    node: Arc<MockNode>,
    wallet: Arc<MockWallet>,
    queries: CheckinQueries,
    action: CheckinAction,
}

fn harness_with(session: Arc<ClientSession>, node: Arc<MockNode>, wallet: Arc<MockWallet>) -> Harness {
    let contract = CheckinContract::new(common::contract_address(), true);
    let cache = Arc::new(QueryCache::default());
    let queries = CheckinQueries::new(session.clone(), contract, cache.clone());
    let action = CheckinAction::new(session, contract, cache, 5, Duration::from_millis(2));
    Harness { node, wallet, queries, action }
}

fn harness() -> Harness {
    let node = MockNode::with_checkin_state();
    let wallet = MockWallet::new();
    let session = common::connected_session(node.clone(), wallet.clone());
    harness_with(session, node, wallet)
}

fn tx_hash() -> B256 {
    TX_HASH.parse().unwrap()
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_overlong_content_rejected_before_network() {
    let h = harness();

    let err = assert_err!(h.action.submit(&"x".repeat(281)).await);
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(h.node.total_calls(), 0);
    assert_eq!(h.wallet.sends(), 0);
    assert_eq!(h.action.state(), CheckinState::Idle);
}

#[tokio::test]
async fn test_content_at_limit_is_submitted() {
    let h = harness();
    h.node.push_tx_status(json!({ "statusName": "FINALIZED" }));

    let pending = assert_ok!(h.action.submit(&"x".repeat(280)).await);
    assert_eq!(pending.hash, tx_hash());
    assert_eq!(h.wallet.sends(), 1);
}

// ============================================================================
// Accepted then finalized
// ============================================================================

#[tokio::test]
async fn test_checkin_accepted_then_finalized_invalidates_queries() {
    let h = harness();

    // Warm all four cached queries
    assert_ok!(h.queries.my_stats().await);
    assert_ok!(h.queries.checked_today().await);
    assert_ok!(h.queries.last_seven_days().await);
    assert_ok!(h.queries.next_reset().await);
    assert_eq!(h.queries.cache().len().await, 4);

    h.node.push_tx_status(json!({ "statusName": "PROPOSING", "status": 1 }));
    h.node.push_tx_status(json!({ "statusName": "ACCEPTED", "status": 5 }));
    h.node.push_tx_status(json!({ "statusName": "FINALIZED", "status": 7 }));

    let mut states = h.action.subscribe();
    let pending = assert_ok!(h.action.submit("gm from the test suite").await);

    assert_eq!(*states.borrow_and_update(), CheckinState::Accepted(tx_hash()));
    assert_eq!(h.node.count("sim_getConsensusContract"), 1);

    assert!(pending.finalized().await);
    assert_eq!(h.action.state(), CheckinState::Finalized(tx_hash()));
    assert!(h.queries.cache().is_empty().await);

    // Next read goes back to the node
    assert_ok!(h.queries.checked_today().await);
    assert_eq!(h.node.reads_of("is_checked_today"), 2);
}

#[tokio::test]
async fn test_empty_content_is_plain_checkin() {
    let h = harness();
    h.node.push_tx_status(json!({ "status": 7 }));

    let pending = assert_ok!(h.action.submit("").await);
    assert!(pending.finalized().await);
    assert_eq!(h.wallet.sends(), 1);
}

#[tokio::test]
async fn test_finalization_timeout_is_swallowed() {
    let h = harness();
    h.node.push_tx_status(json!({ "statusName": "ACCEPTED" }));

    assert_ok!(h.queries.my_stats().await);

    let pending = assert_ok!(h.action.submit("gm").await);
    assert!(!pending.finalized().await);

    assert_eq!(h.action.state(), CheckinState::Accepted(tx_hash()));
    assert_eq!(h.node.count("eth_getTransactionByHash"), 5);

    // Nothing invalidated without finalization
    assert_eq!(h.queries.cache().len().await, 1);
}

// ============================================================================
// Submission errors
// ============================================================================

#[tokio::test]
async fn test_submission_error_surfaced_verbatim() {
    let h = harness();
    h.wallet.reject_sends("insufficient funds for gas * price + value");

    let err = assert_err!(h.action.submit("gm").await);
    assert_eq!(err.to_string(), "insufficient funds for gas * price + value");
    assert_eq!(
        h.action.state(),
        CheckinState::Failed("insufficient funds for gas * price + value".to_string())
    );

    // Not retried
    assert_eq!(h.wallet.sends(), 1);
}

#[tokio::test]
async fn test_submit_allowed_after_failure() {
    let h = harness();
    h.wallet.reject_sends("nonce too low");
    assert_err!(h.action.submit("gm").await);
    assert!(matches!(h.action.state(), CheckinState::Failed(_)));

    h.wallet.accept_sends();
    h.node.push_tx_status(json!({ "statusName": "FINALIZED" }));

    assert_ok!(h.action.submit("gm").await);
    assert_eq!(h.action.state(), CheckinState::Accepted(tx_hash()));
    assert_eq!(h.wallet.sends(), 2);
}

#[tokio::test]
async fn test_late_finalization_keeps_newer_failure() {
    let node = MockNode::with_checkin_state();
    let wallet = MockWallet::new();
    let session = common::connected_session(node.clone(), wallet.clone());
    let contract = CheckinContract::new(common::contract_address(), true);
    let cache = Arc::new(QueryCache::default());
    let queries = CheckinQueries::new(session.clone(), contract, cache.clone());
    let action = CheckinAction::new(session, contract, cache, 200, Duration::from_millis(5));

    node.push_tx_status(json!({ "statusName": "ACCEPTED" }));
    let first = assert_ok!(action.submit("first").await);
    assert_eq!(action.state(), CheckinState::Accepted(tx_hash()));

    // A second attempt fails while the first is still finalizing
    wallet.reject_sends("user rejected");
    assert_err!(action.submit("second").await);
    assert_eq!(action.state(), CheckinState::Failed("user rejected".to_string()));

    assert_ok!(queries.my_stats().await);
    node.push_tx_status(json!({ "statusName": "FINALIZED" }));
    assert!(first.finalized().await);

    assert_eq!(action.state(), CheckinState::Failed("user rejected".to_string()));
    assert!(queries.cache().is_empty().await);
}

#[tokio::test]
async fn test_submit_without_signer() {
    let node = MockNode::with_checkin_state();
    let session = common::session(node.clone());
    let h = harness_with(session, node, MockWallet::new());

    let err = assert_err!(h.action.submit("gm").await);
    assert!(matches!(err, AppError::NoSigner));
    assert!(matches!(h.action.state(), CheckinState::Failed(_)));
}

#[tokio::test]
async fn test_submit_with_unconfigured_contract() {
    let node = MockNode::with_checkin_state();
    let wallet = MockWallet::new();
    let session = common::connected_session(node.clone(), wallet.clone());
    let cache = Arc::new(QueryCache::default());
    let action = CheckinAction::new(
        session,
        CheckinContract::new(common::contract_address(), false),
        cache,
        5,
        Duration::from_millis(2),
    );

    let err = assert_err!(action.submit("gm").await);
    assert_eq!(err.to_string(), "Contract address is not set");
    assert_eq!(wallet.sends(), 0);
    assert_eq!(node.total_calls(), 0);
}
