//! Integration tests for the cached contract queries.
//!
//! Run with: `cargo test --test test_queries`

mod common;

use std::{sync::Arc, time::Duration};

use common::{MockNode, MockWallet};
use gendaily_checkin::{
    services::{CheckinContract, CheckinQueries, QueryCache, QueryKey, QueryKind, RetryPolicy},
    types::Stats,
    AppError,
};
use tokio_test::{assert_err, assert_ok};

fn queries(node: Arc<MockNode>, wallet: Option<Arc<MockWallet>>) -> CheckinQueries {
    let session = match wallet {
        Some(wallet) => common::connected_session(node, wallet),
        None => common::session(node),
    };
    let contract = CheckinContract::new(common::contract_address(), true);
    CheckinQueries::new(session, contract, Arc::new(QueryCache::default())).with_retry(fast_retry())
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

// ============================================================================
// Disabled without an account
// ============================================================================

#[tokio::test]
async fn test_queries_disabled_when_not_connected() {
    let node = MockNode::with_checkin_state();
    let queries = queries(node.clone(), None);

    assert_eq!(assert_ok!(queries.my_stats().await), None);
    assert_eq!(assert_ok!(queries.checked_today().await), None);
    assert_eq!(assert_ok!(queries.last_seven_days().await), None);
    assert_eq!(assert_ok!(queries.next_reset().await), None);

    assert_eq!(node.total_calls(), 0);
}

// ============================================================================
// Reads and caching
// ============================================================================

#[tokio::test]
async fn test_my_stats_decodes_json_string() {
    let node = MockNode::with_checkin_state();
    let queries = queries(node, Some(MockWallet::new()));

    let stats = assert_ok!(queries.my_stats().await);
    assert_eq!(stats, Some(Stats { last_day: 20100, streak: 3, total: 12, total_score: 240 }));
}

#[tokio::test]
async fn test_results_are_cached_per_account() {
    let node = MockNode::with_checkin_state();
    let wallet = MockWallet::new();
    let queries = queries(node.clone(), Some(wallet.clone()));

    assert_eq!(assert_ok!(queries.checked_today().await), Some(true));
    assert_eq!(assert_ok!(queries.checked_today().await), Some(true));
    assert_eq!(node.reads_of("is_checked_today"), 1);

    let key = QueryKey {
        kind: QueryKind::CheckedToday,
        account: wallet.address,
        contract: common::contract_address(),
    };
    assert!(queries.cache().contains(&key).await);

    // invalidation forces a refetch
    assert_eq!(queries.cache().invalidate(QueryKind::CheckedToday).await, 1);
    node.on_read("is_checked_today", false);
    assert_eq!(assert_ok!(queries.checked_today().await), Some(false));
    assert_eq!(node.reads_of("is_checked_today"), 2);
}

#[tokio::test]
async fn test_last_seven_days_anchored_at_current_day() {
    let node = MockNode::with_checkin_state();
    let queries = queries(node.clone(), Some(MockWallet::new()));

    let range = assert_ok!(queries.last_seven_days().await).expect("range");
    assert_eq!(range.start, 20094);
    assert_eq!(range.end(), 20100);
    assert_eq!(range.counts, vec![4, 0, 2, 5, 7, 9, 11]);

    assert_eq!(node.reads_of("current_day_index"), 1);
    assert_eq!(node.reads_of("get_day_range_counts"), 1);
}

#[tokio::test]
async fn test_next_reset() {
    let node = MockNode::with_checkin_state();
    let queries = queries(node, Some(MockWallet::new()));

    assert_eq!(assert_ok!(queries.next_reset().await), Some(1_736_726_400));
}

// ============================================================================
// Retry
// ============================================================================

#[tokio::test]
async fn test_read_retried_until_success() {
    let node = MockNode::with_checkin_state();
    node.fail_reads("next_reset_time", 2);
    let queries = queries(node.clone(), Some(MockWallet::new()));

    assert_eq!(assert_ok!(queries.next_reset().await), Some(1_736_726_400));
    assert_eq!(node.reads_of("next_reset_time"), 3);
}

#[tokio::test]
async fn test_read_error_surfaces_after_retries() {
    let node = MockNode::with_checkin_state();
    node.fail_reads("get_my_stats", 10);
    let queries = queries(node.clone(), Some(MockWallet::new()));

    let err = assert_err!(queries.my_stats().await);
    assert!(matches!(err, AppError::Rpc(_)));

    // first attempt plus three retries
    assert_eq!(node.reads_of("get_my_stats"), 4);
}

#[tokio::test]
async fn test_failed_read_is_not_cached() {
    let node = MockNode::with_checkin_state();
    node.fail_reads("is_checked_today", 4);
    let queries = queries(node.clone(), Some(MockWallet::new()));

    assert_err!(queries.checked_today().await);
    assert!(queries.cache().is_empty().await);

    assert_eq!(assert_ok!(queries.checked_today().await), Some(true));
}
