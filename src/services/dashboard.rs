//! Dashboard composition.

use alloy::primitives::Address;
use serde::Serialize;

use crate::{
    error::Result,
    services::queries::CheckinQueries,
    types::{
        day_index_to_date_string, format_countdown, now_millis, remaining_millis, streak_window,
        trailing_checked, DayCell, Stats,
    },
};

/// Everything the check-in screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Address>,
    pub contract: Address,
    pub stats: Stats,
    /// `YYYY-MM-DD` of the last check-in, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checkin_date: Option<String>,
    pub checked_today: bool,
    /// Oldest first; the last cell is today.
    pub last_7_days: Vec<DayCell>,
    /// Streak days visible at the end of the window.
    pub visible_streak: usize,
    /// Progress towards a 7-day streak, `0.0..=1.0`.
    pub progress_7: f64,
    /// Progress towards a 30-day streak, `0.0..=1.0`.
    pub progress_30: f64,
    /// Unix seconds of the next daily reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_reset: Option<i64>,
    /// Time to the next reset, `HH:MM:SS`.
    pub next_reset_in: String,
}

/// Builds dashboard snapshots from the cached queries.
#[derive(Clone)]
pub struct Dashboard {
    queries: CheckinQueries,
}

impl Dashboard {
    pub fn new(queries: CheckinQueries) -> Self {
        Self { queries }
    }

    /// Assemble a snapshot at the current time.
    pub async fn snapshot(&self) -> Result<DashboardSnapshot> {
        self.snapshot_at(now_millis()).await
    }

    /// Assemble a snapshot as of `now_ms` (Unix milliseconds).
    ///
    /// Without an attached account every query is disabled: stats are zero,
    /// nothing is checked and the window is empty.
    pub async fn snapshot_at(&self, now_ms: i64) -> Result<DashboardSnapshot> {
        // One snapshot for every read, so a signer swap midway cannot mix accounts
        let client = self.queries.session().current().await;
        let account = client.account();

        let stats = self.queries.my_stats_with(&client).await?;
        let checked_today = self.queries.checked_today_with(&client).await?.unwrap_or(false);
        let range = self.queries.last_seven_days_with(&client).await?;
        let next_reset = self.queries.next_reset_with(&client).await?.filter(|t| *t > 0);

        let last_day = stats.map(|s| s.last_day);
        let stats = stats.unwrap_or_default();
        let last_7_days = range
            .map(|range| streak_window(&range, stats.streak, last_day))
            .unwrap_or_default();

        let remain_ms = next_reset.map(|t| remaining_millis(t, now_ms)).unwrap_or(0);

        Ok(DashboardSnapshot {
            connected: account.is_some(),
            account,
            contract: self.queries.contract().address(),
            last_checkin_date: (stats.total > 0)
                .then(|| day_index_to_date_string(stats.last_day))
                .filter(|date| !date.is_empty()),
            checked_today,
            visible_streak: trailing_checked(&last_7_days),
            last_7_days,
            progress_7: goal_progress(stats.streak, 7),
            progress_30: goal_progress(stats.streak, 30),
            stats,
            next_reset,
            next_reset_in: format_countdown(remain_ms),
        })
    }
}

fn goal_progress(streak: i64, goal: i64) -> f64 {
    (streak.max(0) as f64 / goal as f64).min(1.0)
}
