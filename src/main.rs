//! GenLayer Daily Check-in MCP Server
//!
//! A Model Context Protocol server for the daily check-in contract.

use rmcp::ServiceExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gendaily_checkin::{config, CheckinServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present, before anything reads the environment
    let _ = dotenvy::dotenv();

    // Initialize logging first so configuration warnings are not lost
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::log_level_from_env()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!(
        chain_id = config.chain_id,
        contract = %config.contract_address,
        valid_contract = config.has_valid_contract_address,
        "Starting Check-in MCP Server"
    );

    let server = CheckinServer::new(config)?;

    // Run with stdio transport
    let transport = rmcp::transport::stdio();
    let running = server.serve(transport).await?;

    running.waiting().await?;

    Ok(())
}
