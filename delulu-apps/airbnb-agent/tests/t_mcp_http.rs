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

//! MCP server integration tests using HTTP transport.

#![cfg(test)]

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{Duration, Instant};
use tracing::{debug, instrument};
use tracing_subscriber::EnvFilter;

const BINARY: &str = env!("CARGO_BIN_EXE_delulu-airbnb-mcp");
const TIMEOUT: Duration = Duration::from_secs(5);

const INIT_REQUEST: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test-client","version":"1.0"}}}"#;

fn init_tracing() {
    use std::sync::Once;
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

fn get_free_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn spawn_http_server(port: u16) -> Result<Child> {
    Command::new(BINARY)
        .arg("--ignore-robots-txt")
        .arg("--http")
        .arg(format!("--port={}", port))
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .context("Failed to spawn MCP server")
}

/// Polls until the server accepts connections.
async fn connect(port: u16) -> Result<TcpStream> {
    let deadline = Instant::now() + TIMEOUT;
    loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => return Ok(stream),
            Err(e) if Instant::now() < deadline => {
                debug!("Server not up yet: {}", e);
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(e) => return Err(e).context("Server never started listening"),
        }
    }
}

/// Sends one POST to `/mcp` and reads until the JSON-RPC response for `id` 1 shows up.
#[instrument(skip(stream, body))]
async fn post_mcp(stream: &mut TcpStream, port: u16, body: &str) -> Result<String> {
    let request = format!(
        "POST /mcp HTTP/1.1\r\nHost: 127.0.0.1:{}\r\nContent-Type: application/json\r\nAccept: application/json, text/event-stream\r\nContent-Length: {}\r\n\r\n{}",
        port,
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).await?;

    let mut response = Vec::new();
    let mut buf = [0u8; 8192];
    let start = std::time::Instant::now();
    loop {
        match tokio::time::timeout(TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                response.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&response);
                if text.contains("\"id\":1") && text.contains("\"result\"") {
                    debug!("Response received after {:?}", start.elapsed());
                    break;
                }
            }
            Ok(Err(e)) => return Err(e).context("Read error"),
            Err(_) => {
                debug!("Timeout after {:?}", start.elapsed());
                break;
            }
        }
    }
    Ok(String::from_utf8_lossy(&response).into_owned())
}

fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    response
        .split("\r\n\r\n")
        .next()?
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

#[tokio::test]
async fn test_mcp_http_initialize_creates_session() -> Result<()> {
    init_tracing();
    let port = get_free_port()?;
    let _server = spawn_http_server(port)?;

    let mut stream = connect(port).await?;
    let response = post_mcp(&mut stream, port, INIT_REQUEST).await?;
    debug!("Initialize response: {:?}", &response[..response.len().min(400)]);

    assert!(
        response.starts_with("HTTP/1.1 200"),
        "unexpected status line: {}",
        response.lines().next().unwrap_or("")
    );
    let session_id = header(&response, "mcp-session-id").context("No session ID")?;
    assert!(!session_id.is_empty());
    assert!(response.contains("\"protocolVersion\""));
    Ok(())
}

#[tokio::test]
async fn test_mcp_http_rejects_unknown_session() -> Result<()> {
    init_tracing();
    let port = get_free_port()?;
    let _server = spawn_http_server(port)?;

    let mut stream = connect(port).await?;
    let body = r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#;
    let request = format!(
        "POST /mcp HTTP/1.1\r\nHost: 127.0.0.1:{}\r\nContent-Type: application/json\r\nAccept: application/json, text/event-stream\r\nmcp-session-id: no-such-session\r\nContent-Length: {}\r\n\r\n{}",
        port,
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).await?;

    let mut buf = [0u8; 4096];
    let n = tokio::time::timeout(TIMEOUT, stream.read(&mut buf))
        .await
        .context("No response to unknown session")??;
    let response = String::from_utf8_lossy(&buf[..n]);

    assert!(
        !response.starts_with("HTTP/1.1 200"),
        "unknown session accepted: {}",
        response
    );
    Ok(())
}
