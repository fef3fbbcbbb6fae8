//! GenLayer Daily Check-in Library
//!
//! Client for a GenLayer daily check-in intelligent contract, with an MCP
//! server on top. Accounts check in once per day, optionally with a short
//! sentence, and build up streaks and scores.
//!
//! # Features
//!
//! - **Client Session**: A node client with an attachable signing wallet
//! - **Cached Queries**: Stats, today's status, the last 7 days and the next
//!   reset, with retry and backoff
//! - **Check-in Action**: Submission with accepted/finalized tracking and
//!   cache invalidation
//! - **Dashboard**: Streak window, progress and reset countdown
//!
//! # Example
//!
//! ```rust,ignore
//! use gendaily_checkin::{CheckinServer, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let server = CheckinServer::new(config)?;
//!     // Run server...
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod genlayer;
pub mod mcp;
pub mod services;
pub mod types;

pub use config::Config;
pub use error::{AppError, Result};
pub use genlayer::constants::*;
pub use mcp::CheckinServer;
