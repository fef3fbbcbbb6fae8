//! Transaction lifecycle types.

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of a GenLayer transaction as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Uninitialized,
    Pending,
    Proposing,
    Committing,
    Revealing,
    Accepted,
    Undetermined,
    Finalized,
    Canceled,
    AppealRevealing,
    AppealCommitting,
    ReadyToFinalize,
    ValidatorsTimeout,
    LeaderTimeout,
}

impl TransactionStatus {
    const ALL: [TransactionStatus; 14] = [
        Self::Uninitialized,
        Self::Pending,
        Self::Proposing,
        Self::Committing,
        Self::Revealing,
        Self::Accepted,
        Self::Undetermined,
        Self::Finalized,
        Self::Canceled,
        Self::AppealRevealing,
        Self::AppealCommitting,
        Self::ReadyToFinalize,
        Self::ValidatorsTimeout,
        Self::LeaderTimeout,
    ];

    /// Status for the node's numeric code.
    pub fn from_code(code: u64) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// The node's name for this status.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Pending => "PENDING",
            Self::Proposing => "PROPOSING",
            Self::Committing => "COMMITTING",
            Self::Revealing => "REVEALING",
            Self::Accepted => "ACCEPTED",
            Self::Undetermined => "UNDETERMINED",
            Self::Finalized => "FINALIZED",
            Self::Canceled => "CANCELED",
            Self::AppealRevealing => "APPEAL_REVEALING",
            Self::AppealCommitting => "APPEAL_COMMITTING",
            Self::ReadyToFinalize => "READY_TO_FINALIZE",
            Self::ValidatorsTimeout => "VALIDATORS_TIMEOUT",
            Self::LeaderTimeout => "LEADER_TIMEOUT",
        }
    }

    /// Read a status given as a code (`5`, `"5"`) or a name (`"ACCEPTED"`).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().and_then(Self::from_code),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Whether a transaction in this status satisfies a wait for `target`.
    ///
    /// Finalized transactions also satisfy a wait for acceptance.
    pub fn satisfies(self, target: TransactionStatus) -> bool {
        self == target || (target == Self::Accepted && self == Self::Finalized)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u64>() {
            return Self::from_code(code).ok_or_else(|| format!("Unknown status code: {}", s));
        }
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.name() == upper)
            .ok_or_else(|| format!("Unknown transaction status: {}", s))
    }
}

/// Progress of one check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum CheckinState {
    Idle,
    Submitting,
    Accepted(B256),
    Finalized(B256),
    Failed(String),
}

impl CheckinState {
    /// Whether a new submission may start from this state.
    pub fn can_submit(&self) -> bool {
        !matches!(self, CheckinState::Submitting)
    }
}
