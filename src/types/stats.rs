//! Check-in statistics.

use serde::{Deserialize, Serialize};

use crate::genlayer::calldata::CalldataValue;

/// Canonical statistics of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Day index of the most recent check-in.
    pub last_day: i64,
    /// Consecutive days up to and including `last_day`.
    pub streak: i64,
    /// Total check-ins.
    pub total: i64,
    /// Accumulated score.
    pub total_score: i64,
}

const FIELDS: [&str; 4] = ["last_day", "streak", "total", "total_score"];

impl Stats {
    /// Normalize a `get_my_stats` result.
    ///
    /// Contract versions answer with a JSON string, a map or a
    /// `[last_day, streak, total, total_score]` tuple. They are tried in that
    /// order; anything else (and any missing field) reads as zero.
    pub fn from_value(value: &CalldataValue) -> Self {
        match value {
            CalldataValue::Str(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(json) => Self::from_structured(&CalldataValue::from(&json)),
                Err(_) => {
                    tracing::debug!("get_my_stats returned a non-JSON string, treating as empty");
                    Self::default()
                }
            },
            other => Self::from_structured(other),
        }
    }

    fn from_structured(value: &CalldataValue) -> Self {
        if let Some(map) = value.as_map() {
            let field = |name: &str| map.get(name).map(CalldataValue::as_i64_lossy).unwrap_or(0);
            return Self::from_fields(FIELDS.map(field));
        }

        if let Some(items) = value.as_array() {
            let field = |i: usize| items.get(i).map(CalldataValue::as_i64_lossy).unwrap_or(0);
            return Self::from_fields([field(0), field(1), field(2), field(3)]);
        }

        Self::default()
    }

    fn from_fields([last_day, streak, total, total_score]: [i64; 4]) -> Self {
        Self { last_day, streak, total, total_score }
    }
}
