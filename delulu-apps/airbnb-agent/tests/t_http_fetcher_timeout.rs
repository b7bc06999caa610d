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

//! Real HTTP fetcher against a local listener that accepts and never answers.

#![cfg(test)]

use anyhow::Result;
use delulu_airbnb_agent::{
    AirbnbClient, FetchError, Fetcher, HttpFetcher, ScraperConfig, SearchQuery,
};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

/// Accepts connections and keeps them open without writing a byte.
async fn silent_server() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    Ok(format!("http://{}", addr))
}

#[tokio::test]
async fn test_fetch_times_out_with_configured_duration() -> Result<()> {
    let base = silent_server().await?;
    let config = ScraperConfig::default()
        .with_base_url(&base)
        .with_timeout(Duration::from_millis(200));
    let fetcher = HttpFetcher::new(&config)?;
    assert_eq!(fetcher.timeout(), Duration::from_millis(200));

    let start = Instant::now();
    let err = fetcher
        .fetch(&format!("{}/s/Paris/homes", base))
        .await
        .expect_err("silent server must time out");

    assert!(matches!(err, FetchError::Timeout(_)), "unexpected error: {:?}", err);
    assert_eq!(err.to_string(), "Request timeout after 200ms");
    assert!(start.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test]
async fn test_search_timeout_becomes_error_result() -> Result<()> {
    let base = silent_server().await?;
    let config = ScraperConfig::default()
        .with_base_url(&base)
        .with_timeout(Duration::from_millis(200))
        .with_ignore_robots_txt(true);
    let client = AirbnbClient::new(config)?;

    let outcome = client.search(&SearchQuery::new("Paris")).await;

    assert!(outcome.is_error());
    assert_eq!(outcome.body()["error"], "Request timeout after 200ms");
    assert!(
        outcome.body()["searchUrl"]
            .as_str()
            .unwrap()
            .starts_with(&format!("{}/s/Paris/homes", base))
    );
    Ok(())
}

#[tokio::test]
async fn test_connection_refused_is_network_error() -> Result<()> {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?
    };
    let fetcher = HttpFetcher::new(&ScraperConfig::default().with_timeout(Duration::from_secs(2)))?;

    let err = fetcher
        .fetch(&format!("http://{}/robots.txt", addr))
        .await
        .expect_err("nothing listens on a released port");

    assert!(matches!(err, FetchError::Network(_)), "unexpected error: {:?}", err);
    Ok(())
}
