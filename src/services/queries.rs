//! Cached contract queries.
//!
//! Each query is keyed by (query kind, account, contract). Queries are
//! disabled until a signer is attached, retry failed reads with capped
//! exponential backoff, and serve cached results until they go stale or are
//! invalidated.

use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use alloy::primitives::Address;
use tokio::sync::RwLock;

use crate::{
    error::Result,
    genlayer::{CheckinClient, ClientSession},
    services::checkin::CheckinContract,
    types::{DayRange, Stats},
};

/// Default time after which a cached result is refetched.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

/// The cached read queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    MyStats,
    CheckedToday,
    Last7,
    NextReset,
}

impl QueryKind {
    /// Every query whose answer changes after a check-in.
    pub const ALL: [QueryKind; 4] =
        [QueryKind::MyStats, QueryKind::CheckedToday, QueryKind::Last7, QueryKind::NextReset];

    pub fn name(self) -> &'static str {
        match self {
            QueryKind::MyStats => "myStats",
            QueryKind::CheckedToday => "checkedToday",
            QueryKind::Last7 => "last7",
            QueryKind::NextReset => "nextReset",
        }
    }
}

/// Cache key of one query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: QueryKind,
    pub account: Address,
    pub contract: Address,
}

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Stats(Stats),
    Flag(bool),
    Range(DayRange),
    Timestamp(i64),
}

/// Conversion between a query's result type and its cached form.
pub trait Cached: Clone + Sized {
    fn into_data(self) -> QueryData;
    fn from_data(data: &QueryData) -> Option<Self>;
}

impl Cached for Stats {
    fn into_data(self) -> QueryData {
        QueryData::Stats(self)
    }
    fn from_data(data: &QueryData) -> Option<Self> {
        match data {
            QueryData::Stats(s) => Some(*s),
            _ => None,
        }
    }
}

impl Cached for bool {
    fn into_data(self) -> QueryData {
        QueryData::Flag(self)
    }
    fn from_data(data: &QueryData) -> Option<Self> {
        match data {
            QueryData::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl Cached for DayRange {
    fn into_data(self) -> QueryData {
        QueryData::Range(self)
    }
    fn from_data(data: &QueryData) -> Option<Self> {
        match data {
            QueryData::Range(r) => Some(r.clone()),
            _ => None,
        }
    }
}

impl Cached for i64 {
    fn into_data(self) -> QueryData {
        QueryData::Timestamp(self)
    }
    fn from_data(data: &QueryData) -> Option<Self> {
        match data {
            QueryData::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

/// Retry schedule for failed reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.checked_mul(factor).unwrap_or(self.max_delay).min(self.max_delay)
    }
}

struct CacheEntry {
    data: QueryData,
    fetched_at: Instant,
}

/// Keyed store of query results.
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    stale_after: Duration,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self { entries: RwLock::new(HashMap::new()), stale_after }
    }

    /// A result that is still fresh.
    pub async fn get(&self, key: &QueryKey) -> Option<QueryData> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.stale_after)
            .map(|entry| entry.data.clone())
    }

    pub async fn put(&self, key: QueryKey, data: QueryData) {
        self.entries.write().await.insert(key, CacheEntry { data, fetched_at: Instant::now() });
    }

    /// Drop every result of `kind`, for all accounts. Returns how many were dropped.
    pub async fn invalidate(&self, kind: QueryKind) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| key.kind != kind);
        let dropped = before - entries.len();
        tracing::debug!(query = kind.name(), dropped, "Invalidated query");
        dropped
    }

    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }

    /// Whether any result (fresh or stale) is stored for `key`.
    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER)
    }
}

/// The read side of the check-in contract, cached.
///
/// Every query returns `Ok(None)` while no account is attached.
#[derive(Clone)]
pub struct CheckinQueries {
    session: Arc<ClientSession>,
    contract: CheckinContract,
    cache: Arc<QueryCache>,
    retry: RetryPolicy,
}

impl CheckinQueries {
    pub fn new(session: Arc<ClientSession>, contract: CheckinContract, cache: Arc<QueryCache>) -> Self {
        Self { session, contract, cache, retry: RetryPolicy::default() }
    }

    /// Replace the retry schedule.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn session(&self) -> &Arc<ClientSession> {
        &self.session
    }

    pub fn contract(&self) -> CheckinContract {
        self.contract
    }

    pub async fn my_stats(&self) -> Result<Option<Stats>> {
        self.my_stats_with(&self.session.current().await).await
    }

    pub async fn checked_today(&self) -> Result<Option<bool>> {
        self.checked_today_with(&self.session.current().await).await
    }

    /// Last seven days of counts, anchored at the contract's current day.
    pub async fn last_seven_days(&self) -> Result<Option<DayRange>> {
        self.last_seven_days_with(&self.session.current().await).await
    }

    /// Next reset time in Unix seconds.
    pub async fn next_reset(&self) -> Result<Option<i64>> {
        self.next_reset_with(&self.session.current().await).await
    }

    /// [`Self::my_stats`] against a given client snapshot.
    pub async fn my_stats_with(&self, client: &Arc<CheckinClient>) -> Result<Option<Stats>> {
        self.fetch(client, QueryKind::MyStats, |client, contract| async move {
            contract.get_my_stats(&client).await
        })
        .await
    }

    pub async fn checked_today_with(&self, client: &Arc<CheckinClient>) -> Result<Option<bool>> {
        self.fetch(client, QueryKind::CheckedToday, |client, contract| async move {
            contract.is_checked_today(&client).await
        })
        .await
    }

    pub async fn last_seven_days_with(
        &self,
        client: &Arc<CheckinClient>,
    ) -> Result<Option<DayRange>> {
        self.fetch(client, QueryKind::Last7, |client, contract| async move {
            contract.last_seven_days(&client).await
        })
        .await
    }

    pub async fn next_reset_with(&self, client: &Arc<CheckinClient>) -> Result<Option<i64>> {
        self.fetch(client, QueryKind::NextReset, |client, contract| async move {
            contract.next_reset_time(&client).await
        })
        .await
    }

    async fn fetch<T, F, Fut>(
        &self,
        client: &Arc<CheckinClient>,
        kind: QueryKind,
        read: F,
    ) -> Result<Option<T>>
    where
        T: Cached,
        F: Fn(Arc<CheckinClient>, CheckinContract) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(account) = client.account() else {
            tracing::trace!(query = kind.name(), "Query disabled: no account");
            return Ok(None);
        };

        let key = QueryKey { kind, account, contract: self.contract.address() };
        if let Some(hit) = self.cache.get(&key).await.as_ref().and_then(T::from_data) {
            return Ok(Some(hit));
        }

        let mut attempt = 0;
        loop {
            match read(client.clone(), self.contract).await {
                Ok(value) => {
                    self.cache.put(key, value.clone().into_data()).await;
                    return Ok(Some(value));
                }
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        query = kind.name(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Query failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(query = kind.name(), error = %e, "Query failed");
                    return Err(e);
                }
            }
        }
    }
}
