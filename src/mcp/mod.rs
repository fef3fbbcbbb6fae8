//! MCP server module.
//!
//! Contains the MCP server implementation with tool handlers.

pub mod server;

pub use server::CheckinServer;
pub use server::{CheckInInput, GetCheckinInput};
