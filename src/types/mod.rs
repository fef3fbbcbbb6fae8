//! Type definitions module.
//!
//! Contains shared types used across the application.

pub mod days;
pub mod stats;
pub mod transaction;

pub use days::*;
pub use stats::Stats;
pub use transaction::{CheckinState, TransactionStatus};
