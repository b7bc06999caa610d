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

//! MCP server integration tests using subprocess with stdio transport.

#![cfg(test)]

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::process::Stdio;
use std::sync::Once;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;

const TIMEOUT: Duration = Duration::from_secs(5);
const BINARY: &str = env!("CARGO_BIN_EXE_delulu-airbnb-mcp");

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_thread_ids(true)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::new("debug"))
            .init();
    });
}

struct McpSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl McpSession {
    fn spawn() -> Result<Self> {
        let mut child = Command::new(BINARY)
            .arg("--ignore-robots-txt")
            .env("RUST_LOG", "warn")
            .stdout(Stdio::piped())
            .stdin(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to spawn MCP server")?;

        let stdin = child.stdin.take().context("no stdin")?;
        let stdout = BufReader::new(child.stdout.take().context("no stdout")?).lines();
        Ok(Self {
            _child: child,
            stdin,
            stdout,
        })
    }

    async fn send(&mut self, message: Value) -> Result<()> {
        let mut line = message.to_string();
        line.push('\n');
        tracing::debug!("-> {}", line.trim_end());
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads lines until the response carrying `id`, skipping notifications.
    async fn response(&mut self, id: u64) -> Result<Value> {
        loop {
            let line = tokio::time::timeout(TIMEOUT, self.stdout.next_line())
                .await
                .context("Timed out waiting for a response")??
                .context("Server closed stdout")?;
            tracing::debug!("<- {}", line);
            let message: Value = serde_json::from_str(&line)
                .context(format!("Response is not JSON: {}", line))?;
            if message["id"] == id {
                return Ok(message);
            }
        }
    }

    async fn request(&mut self, id: u64, method: &str, params: Value) -> Result<Value> {
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await?;
        self.response(id).await
    }

    async fn initialize(&mut self) -> Result<Value> {
        let response = self
            .request(
                1,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }),
            )
            .await?;
        self.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;
        Ok(response)
    }
}

#[tokio::test]
async fn test_mcp_initialize() -> Result<()> {
    init_tracing();
    let mut session = McpSession::spawn()?;

    let response = session.initialize().await?;

    assert_eq!(response["jsonrpc"], "2.0");
    assert!(response["result"]["capabilities"]["tools"].is_object());
    assert!(response["result"]["serverInfo"]["name"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_mcp_tools_list() -> Result<()> {
    init_tracing();
    let mut session = McpSession::spawn()?;
    session.initialize().await?;

    let response = session.request(2, "tools/list", json!({})).await?;

    let tools = response["result"]["tools"]
        .as_array()
        .context("tools/list returned no tools array")?;
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names.len(), 2, "unexpected tools: {:?}", names);
    assert!(names.contains(&"airbnb_search"));
    assert!(names.contains(&"airbnb_listing_details"));

    let search = tools
        .iter()
        .find(|t| t["name"] == "airbnb_search")
        .context("airbnb_search missing")?;
    let properties = &search["inputSchema"]["properties"];
    for field in ["location", "placeId", "checkin", "checkout", "adults", "cursor", "ignoreRobotsText"] {
        assert!(properties.get(field).is_some(), "airbnb_search lacks `{}`", field);
    }
    Ok(())
}

#[tokio::test]
async fn test_mcp_unknown_tool() -> Result<()> {
    init_tracing();
    let mut session = McpSession::spawn()?;
    session.initialize().await?;

    let response = session
        .request(3, "tools/call", json!({"name": "airbnb_book", "arguments": {}}))
        .await?;

    assert!(response.get("result").is_none());
    assert_eq!(response["error"]["code"], -32601);
    Ok(())
}

#[tokio::test]
async fn test_mcp_invalid_arguments_give_error_result() -> Result<()> {
    init_tracing();
    let mut session = McpSession::spawn()?;
    session.initialize().await?;

    let response = session
        .request(
            4,
            "tools/call",
            json!({
                "name": "airbnb_search",
                "arguments": {"location": "Paris", "checkin": "2026-03-05", "checkout": "2026-03-01"}
            }),
        )
        .await?;

    let result = &response["result"];
    assert_eq!(result["isError"], true);
    let text = result["content"][0]["text"]
        .as_str()
        .context("error result has no text content")?;
    let body: Value = serde_json::from_str(text)?;
    assert!(body["error"].as_str().unwrap_or("").starts_with("Invalid parameters"));
    assert!(body["searchUrl"].as_str().unwrap_or("").contains("/s/Paris/homes"));
    Ok(())
}

#[tokio::test]
async fn test_mcp_help_output() -> Result<()> {
    init_tracing();
    let output = Command::new(BINARY).arg("--help").output().await?;

    assert!(output.status.success(), "Help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("delulu-airbnb-mcp"), "Help should show binary name");
    assert!(stdout.contains("--http"), "Help should show the http flag");
    assert!(stdout.contains("--ignore-robots-txt"), "Help should show the robots flag");

    Ok(())
}

#[tokio::test]
async fn test_mcp_version_output() -> Result<()> {
    init_tracing();
    let output = Command::new(BINARY).arg("--version").output().await?;

    assert!(output.status.success(), "Version should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1.0"), "Version should show 0.1.0");

    Ok(())
}
