//! MCP server implementation.

use std::sync::Arc;

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    genlayer::{CheckinClient, ClientSession, HttpTransport, LocalWallet},
    services::{CheckinAction, CheckinContract, CheckinQueries, Dashboard, QueryCache},
    types::{format_countdown, now_millis, remaining_millis},
};

/// GenLayer Daily Check-in MCP Server.
///
/// Provides tools for reading check-in statistics and submitting the daily
/// check-in.
#[derive(Clone)]
pub struct CheckinServer {
    session: Arc<ClientSession>,
    contract: CheckinContract,
    queries: CheckinQueries,
    dashboard: Dashboard,
    action: Arc<CheckinAction>,
    tool_router: ToolRouter<Self>,
}

impl CheckinServer {
    /// Create a new Check-in MCP Server.
    ///
    /// Note: This uses lazy initialization - no network calls are made during
    /// server startup. The consensus contract is resolved on the first
    /// check-in.
    pub fn new(config: Config) -> Result<Self, AppError> {
        tracing::info!(rpc_url = %config.rpc_url, "Initializing Check-in MCP Server");

        let transport = HttpTransport::new(&config.rpc_url)?;
        let provider = transport.provider().clone();
        let mut client = CheckinClient::new(Arc::new(transport), config.chain_id);

        // Attach the local wallet when a key is configured
        if let Some(key) = &config.private_key {
            let wallet = LocalWallet::from_private_key(key, config.chain_id, provider)?;
            let address = wallet.address();
            client = client.with_signer(Arc::new(wallet), address);
        } else {
            tracing::warn!("No private key configured, running read-only");
        }

        let server = Self::with_session(&config, Arc::new(ClientSession::new(client)));
        tracing::info!("Check-in MCP Server initialized successfully");
        Ok(server)
    }

    /// Create a server on an existing session.
    pub fn with_session(config: &Config, session: Arc<ClientSession>) -> Self {
        let contract = CheckinContract::from_config(config);
        let cache = Arc::new(QueryCache::default());
        let queries = CheckinQueries::new(session.clone(), contract, cache.clone());
        let action = CheckinAction::from_config(config, session.clone(), cache);

        Self {
            session,
            contract,
            dashboard: Dashboard::new(queries.clone()),
            queries,
            action: Arc::new(action),
            tool_router: Self::tool_router(),
        }
    }

    pub fn session(&self) -> &Arc<ClientSession> {
        &self.session
    }

    pub fn action(&self) -> &Arc<CheckinAction> {
        &self.action
    }
}

/// Input parameters for the check_in tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct CheckInInput {
    /// Check-in sentence, at most 280 characters. Omit for a plain check-in.
    #[serde(default)]
    pub content: Option<String>,
    /// Wait until the check-in is finalized before returning. Default: false.
    #[serde(default)]
    pub wait_for_finalization: Option<bool>,
}

/// Input parameters for the get_checkin tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetCheckinInput {
    /// Check-in id.
    pub cid: i64,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl CheckinServer {
    /// Everything the check-in screen shows in one call.
    #[tool(
        description = "Get the check-in dashboard: stats, whether today is checked, the last 7 days with streak marks, and the time to the next daily reset"
    )]
    pub async fn get_dashboard(&self) -> Result<String, McpError> {
        tracing::info!("get_dashboard called");
        let snapshot = self.dashboard.snapshot().await?;
        to_json(&snapshot)
    }

    #[tool(description = "Get the connected account's check-in stats (last day, streak, total, score)")]
    pub async fn get_my_stats(&self) -> Result<String, McpError> {
        tracing::info!("get_my_stats called");
        let stats = self.queries.my_stats().await?.unwrap_or_default();
        to_json(&stats)
    }

    #[tool(description = "Whether the connected account has checked in today")]
    pub async fn is_checked_today(&self) -> Result<String, McpError> {
        tracing::info!("is_checked_today called");
        let checked = self.queries.checked_today().await?.unwrap_or(false);
        to_json(&json!({ "checked_today": checked }))
    }

    #[tool(description = "Contract-wide check-in counts for the last 7 days, oldest first")]
    pub async fn get_last_7_days(&self) -> Result<String, McpError> {
        tracing::info!("get_last_7_days called");
        let range = self.queries.last_seven_days().await?;
        to_json(&range)
    }

    #[tool(description = "Time of the next daily reset (Unix seconds) and the countdown to it")]
    pub async fn get_next_reset(&self) -> Result<String, McpError> {
        tracing::info!("get_next_reset called");
        let next_reset = self.queries.next_reset().await?;
        let remain = next_reset.map(|t| remaining_millis(t, now_millis())).unwrap_or(0);
        to_json(&json!({
            "next_reset": next_reset,
            "next_reset_in": format_countdown(remain),
        }))
    }

    /// Submit today's check-in.
    ///
    /// Returns once the transaction is accepted; finalization continues in the
    /// background unless `wait_for_finalization` is set.
    #[tool(
        description = "Check in for today with an optional sentence (max 280 characters). Requires a configured private key."
    )]
    pub async fn check_in(
        &self,
        Parameters(input): Parameters<CheckInInput>,
    ) -> Result<String, McpError> {
        let content = input.content.unwrap_or_default();
        tracing::info!(chars = content.chars().count(), "check_in called");

        let pending = self.action.submit(&content).await?;
        let hash = pending.hash;

        let finalized = if input.wait_for_finalization.unwrap_or(false) {
            Some(pending.finalized().await)
        } else {
            None
        };

        to_json(&json!({
            "hash": hash,
            "state": self.action.state(),
            "finalized": finalized,
        }))
    }

    #[tool(description = "State of the latest check-in attempt (idle, submitting, accepted, finalized, failed)")]
    pub async fn get_checkin_state(&self) -> Result<String, McpError> {
        to_json(&self.action.state())
    }

    #[tool(description = "Get one check-in record by id")]
    pub async fn get_checkin(
        &self,
        Parameters(input): Parameters<GetCheckinInput>,
    ) -> Result<String, McpError> {
        tracing::info!(cid = input.cid, "get_checkin called");
        if input.cid < 0 {
            return Err(McpError::invalid_params("cid must not be negative", None));
        }
        let client = self.session.current().await;
        let record = self.contract.get_checkin(&client, input.cid).await?;
        to_json(&record)
    }

    #[tool(description = "Get the contract's content and scoring policy")]
    pub async fn get_policy(&self) -> Result<String, McpError> {
        tracing::info!("get_policy called");
        let client = self.session.current().await;
        let policy = self.contract.get_policy(&client).await?;
        to_json(&policy)
    }

    #[tool(description = "Id of the connected account's check-in today (0 when none)")]
    pub async fn get_today_checkin_id(&self) -> Result<String, McpError> {
        tracing::info!("get_today_checkin_id called");
        let client = self.session.current().await;
        if client.account().is_none() {
            return to_json(&json!({ "cid": 0 }));
        }
        let cid = self.contract.my_today_cid(&client).await?;
        to_json(&json!({ "cid": cid }))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for CheckinServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "gendaily-checkin".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "GenLayer Daily Check-in MCP Server. Provides tools for reading check-in \
                 stats and streaks, and for submitting the daily check-in."
                    .to_string(),
            ),
        }
    }
}
