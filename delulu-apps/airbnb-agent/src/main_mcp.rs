//!  Delulu Airbnb Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Airbnb MCP Server Entry Point
//!
//! Serves over stdio by default, or over streamable HTTP with `--http`.

use anyhow::{Context, Error, Result};
use clap::Parser;
use delulu_airbnb_agent::{AirbnbClient, ListingQuery, ScraperConfig, SearchQuery, ToolOutcome};
use rmcp::handler::server::{ServerHandler, tool::ToolRouter, wrapper::Parameters};
use rmcp::service::serve_server;
use rmcp::tool;
use rmcp::tool_router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "delulu-airbnb-mcp")]
#[command(
    author,
    version,
    about = "MCP server for Airbnb stay search and listing details"
)]
struct Args {
    /// Never fetch robots.txt; every path is allowed
    #[arg(long)]
    ignore_robots_txt: bool,

    /// Serve over streamable HTTP instead of stdio
    #[arg(long)]
    http: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value = "3000")]
    port: u16,
}

#[derive(Clone)]
pub struct AirbnbAgentServer {
    client: AirbnbClient,
    tool_router: ToolRouter<Self>,
}

impl AirbnbAgentServer {
    pub fn new(client: AirbnbClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl AirbnbAgentServer {
    #[tool(
        name = "airbnb_search",
        description = "Search for Airbnb listings with various filters and pagination. Parameters: location (city/area), placeId, checkin/checkout (YYYY-MM-DD), adults, children, infants, pets, minPrice, maxPrice, cursor (from paginationInfo), ignoreRobotsText. Provide direct links to the user."
    )]
    async fn airbnb_search(&self, params: Parameters<SearchQuery>) -> Result<String, String> {
        let query = params.0;
        let client = self.client.clone();
        tracing::debug!("airbnb_search: {:?}", query);
        let task = tokio::spawn(async move { client.search(&query).await });
        ToolOutcome::from_join(task.await).into_result()
    }

    #[tool(
        name = "airbnb_listing_details",
        description = "Get detailed information about a specific Airbnb listing. Parameters: id, checkin/checkout (YYYY-MM-DD), adults, children, infants, pets, ignoreRobotsText. Provide direct links to the user."
    )]
    async fn airbnb_listing_details(
        &self,
        params: Parameters<ListingQuery>,
    ) -> Result<String, String> {
        let query = params.0;
        let client = self.client.clone();
        tracing::debug!("airbnb_listing_details: {:?}", query);
        let task = tokio::spawn(async move { client.listing_details(&query).await });
        ToolOutcome::from_join(task.await).into_result()
    }
}

impl ServerHandler for AirbnbAgentServer {
    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::ListToolsResult, rmcp::ErrorData>> + Send + '_
    {
        Box::pin(async move {
            let tools = self.tool_router.list_all();
            tracing::debug!("Returning {} tools", tools.len());
            Ok(rmcp::model::ListToolsResult::with_all_items(tools))
        })
    }

    fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl Future<Output = Result<rmcp::model::CallToolResult, rmcp::ErrorData>> + Send + '_
    {
        let router = self.tool_router.clone();
        let self_clone = self.clone();
        Box::pin(async move {
            let known = router
                .list_all()
                .iter()
                .any(|tool| tool.name == request.name);
            if !known {
                tracing::warn!("Unknown tool requested: {}", request.name);
                return Err(rmcp::ErrorData::new(
                    rmcp::model::ErrorCode::METHOD_NOT_FOUND,
                    format!("Unknown tool: {}", request.name),
                    None,
                ));
            }
            let context =
                rmcp::handler::server::tool::ToolCallContext::new(&self_clone, request, context);
            router.call(context).await
        })
    }

    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2025_03_26,
            capabilities: rmcp::model::ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                ..Default::default()
            },
            server_info: rmcp::model::Implementation::from_build_env(),
            instructions: Some(
                "Search Airbnb stays and fetch listing details. Results are compact JSON; \
                 always give the user the direct listing links."
                    .to_string(),
            ),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down HTTP server");
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();
    tracing::debug!("Parsed args: {:?}", args);

    let config = ScraperConfig::default().with_ignore_robots_txt(args.ignore_robots_txt);
    if config.ignore_robots_txt {
        tracing::info!("robots.txt checks disabled for this process");
    }
    let client = AirbnbClient::new(config).context("Failed to create Airbnb client")?;
    let server = AirbnbAgentServer::new(client);

    if args.http {
        let addr: SocketAddr = format!("{}:{}", args.host, args.port)
            .parse()
            .context("Invalid host:port")?;
        tracing::info!("Starting MCP server over HTTP on {}", addr);
        let session_manager = Arc::new(LocalSessionManager::default());
        let config = StreamableHttpServerConfig {
            stateful_mode: true,
            ..Default::default()
        };
        let service =
            StreamableHttpService::new(move || Ok(server.clone()), session_manager, config);
        let app = axum::Router::new().nest_service("/mcp", service);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("Failed to bind to address")?;
        tracing::debug!("Listening on {}", addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;
    } else {
        tracing::info!("Starting MCP server over stdio");
        let (stdin, stdout) = rmcp::transport::io::stdio();
        let running = serve_server(server, (stdin, stdout))
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
        let reason = running.waiting().await.context("Server task failed")?;
        tracing::info!("MCP stdio session ended: {:?}", reason);
    }

    Ok(())
}
