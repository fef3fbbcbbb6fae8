//! Check-in contract bindings.

use alloy::primitives::{Address, B256, U256};
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppError, Result},
    genlayer::{calldata::CalldataValue, constants::WINDOW_DAYS, CheckinClient},
    types::{DayRange, Stats},
};

/// Typed access to the check-in contract.
///
/// Every call takes the client to run against, so one logical operation uses
/// one client snapshot throughout. When the configured address was invalid,
/// views answer with safe defaults instead of reaching the network and the
/// write fails with [`AppError::NotConfigured`].
#[derive(Debug, Clone, Copy)]
pub struct CheckinContract {
    address: Address,
    configured: bool,
}

impl CheckinContract {
    pub fn new(address: Address, configured: bool) -> Self {
        Self { address, configured }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.contract_address, config.has_valid_contract_address)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether a well-formed contract address was configured.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn unconfigured(&self, function: &str) -> bool {
        if !self.configured {
            tracing::warn!(function, "Contract address is not set, returning default");
        }
        !self.configured
    }

    async fn read(
        &self,
        client: &CheckinClient,
        function: &str,
        args: Vec<CalldataValue>,
    ) -> Result<CalldataValue> {
        client.read_contract(self.address, function, args).await.map_err(|e| {
            tracing::error!(function, error = %e, "Contract read failed");
            e
        })
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// The caller's statistics.
    pub async fn get_my_stats(&self, client: &CheckinClient) -> Result<Stats> {
        if self.unconfigured("get_my_stats") {
            return Ok(Stats::default());
        }
        let value = self.read(client, "get_my_stats", vec![]).await?;
        Ok(Stats::from_value(&value))
    }

    /// Whether the caller has checked in during the current day.
    pub async fn is_checked_today(&self, client: &CheckinClient) -> Result<bool> {
        if self.unconfigured("is_checked_today") {
            return Ok(false);
        }
        Ok(self.read(client, "is_checked_today", vec![]).await?.is_truthy())
    }

    /// The contract's current day index.
    pub async fn current_day_index(&self, client: &CheckinClient) -> Result<i64> {
        if self.unconfigured("current_day_index") {
            return Ok(0);
        }
        Ok(self.read(client, "current_day_index", vec![]).await?.as_i64_lossy())
    }

    /// Unix time (seconds) at which the current day ends.
    pub async fn next_reset_time(&self, client: &CheckinClient) -> Result<i64> {
        if self.unconfigured("next_reset_time") {
            return Ok(0);
        }
        Ok(self.read(client, "next_reset_time", vec![]).await?.as_i64_lossy())
    }

    /// Contract-wide check-in counts for days `start..=end`.
    pub async fn get_day_range_counts(
        &self,
        client: &CheckinClient,
        start: i64,
        end: i64,
    ) -> Result<DayRange> {
        if self.unconfigured("get_day_range_counts") {
            return Ok(DayRange::zeroed(start, end));
        }

        let value =
            self.read(client, "get_day_range_counts", vec![start.into(), end.into()]).await?;
        let items = value.as_array().ok_or_else(|| {
            AppError::Parse(format!("get_day_range_counts returned {:?}", value))
        })?;

        let counts = items.iter().map(|v| v.as_i64_lossy().max(0) as u64).collect();
        Ok(DayRange { start, counts })
    }

    /// Counts for the seven days ending at the contract's current day.
    ///
    /// Two sequential reads; a day boundary between them is not corrected.
    pub async fn last_seven_days(&self, client: &CheckinClient) -> Result<DayRange> {
        let today = self.current_day_index(client).await?;
        self.get_day_range_counts(client, today.saturating_sub(WINDOW_DAYS - 1), today).await
    }

    /// Id of the caller's check-in today (0 when none).
    pub async fn my_today_cid(&self, client: &CheckinClient) -> Result<i64> {
        if self.unconfigured("my_today_cid") {
            return Ok(0);
        }
        Ok(self.read(client, "my_today_cid", vec![]).await?.as_i64_lossy())
    }

    /// One check-in record.
    pub async fn get_checkin(&self, client: &CheckinClient, cid: i64) -> Result<Value> {
        if self.unconfigured("get_checkin") {
            return Ok(Value::Object(Default::default()));
        }
        Ok(normalize_object(self.read(client, "get_checkin", vec![cid.into()]).await?))
    }

    /// The contract's scoring and content policy.
    pub async fn get_policy(&self, client: &CheckinClient) -> Result<Value> {
        if self.unconfigured("get_policy") {
            return Ok(Value::Object(Default::default()));
        }
        Ok(normalize_object(self.read(client, "get_policy", vec![]).await?))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Check in with `content` (empty for the legacy check-in).
    pub async fn checkin_sentence(&self, client: &CheckinClient, content: &str) -> Result<B256> {
        if !self.configured {
            return Err(AppError::NotConfigured);
        }
        client
            .write_contract(self.address, "checkin_sentence", vec![content.into()], U256::ZERO)
            .await
    }
}

/// JSON view of a record: JSON-in-a-string results are unwrapped.
fn normalize_object(value: CalldataValue) -> Value {
    match &value {
        CalldataValue::Str(raw) => serde_json::from_str(raw).unwrap_or_else(|_| value.to_json()),
        _ => value.to_json(),
    }
}
