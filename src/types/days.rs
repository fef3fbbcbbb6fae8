//! Day indices, the streak window and the reset countdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::genlayer::constants::SECONDS_PER_DAY;

/// Current Unix time in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Day index of a Unix timestamp (`floor(secs / 86400)`).
pub fn day_index_from_unix(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(SECONDS_PER_DAY)
}

fn day_start(day_index: i64) -> Option<DateTime<Utc>> {
    day_index.checked_mul(SECONDS_PER_DAY).and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// `YYYY-MM-DD` of a day index (UTC).
pub fn day_index_to_date_string(day_index: i64) -> String {
    day_start(day_index).map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// `MM-DD` label of a day index (UTC).
pub fn day_label(day_index: i64) -> String {
    day_start(day_index).map(|d| d.format("%m-%d").to_string()).unwrap_or_default()
}

/// Format a remaining duration as `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_countdown(remain_ms: i64) -> String {
    if remain_ms <= 0 {
        return "00:00:00".to_string();
    }
    let h = remain_ms / 3_600_000;
    let m = (remain_ms % 3_600_000) / 60_000;
    let s = (remain_ms % 60_000) / 1000;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Milliseconds from `now_ms` until `next_reset` (Unix seconds).
pub fn remaining_millis(next_reset: i64, now_ms: i64) -> i64 {
    next_reset.saturating_mul(1000).saturating_sub(now_ms)
}

/// Per-day check-in counts for a contiguous window of days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    /// Day index of `counts[0]`.
    pub start: i64,
    /// Check-ins per day.
    pub counts: Vec<u64>,
}

impl DayRange {
    /// A zero-filled range covering `start..=end`.
    pub fn zeroed(start: i64, end: i64) -> Self {
        let len = end
            .checked_sub(start)
            .and_then(|d| d.checked_add(1))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        Self { start, counts: vec![0; len] }
    }

    /// Day index of the last entry, or `start - 1` for an empty range.
    /// Saturates at the ends of `i64`.
    pub fn end(&self) -> i64 {
        match i64::try_from(self.counts.len()).unwrap_or(i64::MAX) {
            0 => self.start.saturating_sub(1),
            len => self.start.saturating_add(len - 1),
        }
    }
}

/// One day of the streak window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub day_index: i64,
    /// `MM-DD`.
    pub label: String,
    /// Whether the account's streak covers this day.
    pub checked: bool,
    pub is_today: bool,
    /// Contract-wide check-ins that day.
    pub count: u64,
}

/// Mark the days of `range` covered by the account's streak.
///
/// Day `d` is checked iff `streak > 0` and `last - streak + 1 <= d <= last`,
/// where `last` is the account's last check-in day, or the final day of the
/// range when it is unknown. The final day of the range is today.
pub fn streak_window(range: &DayRange, streak: i64, last_day: Option<i64>) -> Vec<DayCell> {
    let streak = streak.max(0);
    let last = last_day.unwrap_or_else(|| range.end());

    range
        .counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let day_index = range.start.saturating_add(i as i64);
            // `last - day_index < streak`, without overflowing near the ends of i64
            let checked = streak > 0
                && day_index <= last
                && last.checked_sub(day_index).is_some_and(|gap| gap < streak);
            DayCell {
                day_index,
                label: day_label(day_index),
                checked,
                is_today: i + 1 == range.counts.len(),
                count,
            }
        })
        .collect()
}

/// Checked days counted backwards from the newest cell.
pub fn trailing_checked(cells: &[DayCell]) -> usize {
    cells.iter().rev().take_while(|c| c.checked).count()
}
