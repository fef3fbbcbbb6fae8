//! GenLayer network constants.
//!
//! Contains chain IDs, endpoints and the default check-in deployment.

use std::time::Duration;

use alloy::primitives::{address, Address};

// ============================================================================
// Chain IDs
// ============================================================================

/// GenLayer StudioNet chain ID.
pub const STUDIONET_CHAIN_ID: u64 = 61999;

/// GenLayer localnet chain ID.
pub const LOCALNET_CHAIN_ID: u64 = 61127;

// ============================================================================
// Endpoints
// ============================================================================

/// StudioNet JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://studio.genlayer.com/api";

/// Timeout for a single JSON-RPC round trip.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Check-in Contract
// ============================================================================

/// Default check-in contract deployment on StudioNet.
pub const DEFAULT_CONTRACT_ADDRESS: Address =
    address!("95758c22476ABC199C9A7698bFd083be84A08CF5");

/// Longest check-in content accepted client-side, in characters.
pub const MAX_CONTENT_CHARS: usize = 280;

/// Number of days in the streak window.
pub const WINDOW_DAYS: i64 = 7;

/// Seconds in one contract day.
pub const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================================
// Consensus
// ============================================================================

/// Name under which the node reports the consensus-main contract.
pub const CONSENSUS_MAIN_CONTRACT: &str = "ConsensusMain";

/// Validators asked to execute a write.
pub const DEFAULT_NUM_OF_INITIAL_VALIDATORS: u64 = 5;

/// Leader rotations allowed for a write.
pub const DEFAULT_MAX_ROTATIONS: u64 = 3;

// ============================================================================
// Polling
// ============================================================================

/// Finalization polls after a check-in.
pub const DEFAULT_FINALIZE_RETRIES: u32 = 100;

/// Delay between finalization polls.
pub const DEFAULT_FINALIZE_INTERVAL: Duration = Duration::from_millis(3000);
