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

//! # Tool Outcome
//!
//! Uniform result of a tool invocation: a JSON body flagged as success or
//! failure. Both are rendered as the text content of the tool result.

use crate::scrape_errors::ScrapeError;
use serde_json::{Value, json};
use tokio::task::JoinError;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Failure(Value),
}

impl ToolOutcome {
    /// Error body for a failed extraction. `url_key` names the attempted URL
    /// (`searchUrl` / `listingUrl`); robots rejections always use `url`.
    pub fn failure(err: &ScrapeError, url_key: &str, url: &str) -> Self {
        let mut body = json!({ "error": err.to_string() });
        match err {
            ScrapeError::PolicyViolation => body["url"] = json!(url),
            ScrapeError::PageNotReady { html_length } => {
                body[url_key] = json!(url);
                body["htmlLength"] = json!(html_length);
            }
            _ => body[url_key] = json!(url),
        }
        ToolOutcome::Failure(body)
    }

    /// Error body for a failure that happened outside any extractor.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        ToolOutcome::Failure(json!({ "error": format!("Internal error: {}", message) }))
    }

    /// Result of an extractor run on its own task. A panicked or cancelled
    /// task becomes an internal error body.
    pub fn from_join(joined: Result<ToolOutcome, JoinError>) -> Self {
        joined.unwrap_or_else(|e| {
            tracing::error!("Extractor task aborted: {}", e);
            ToolOutcome::internal(e)
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Failure(_))
    }

    pub fn body(&self) -> &Value {
        match self {
            ToolOutcome::Success(body) | ToolOutcome::Failure(body) => body,
        }
    }

    /// `Ok` text becomes a result with `isError: false`, `Err` text one with `isError: true`.
    pub fn into_result(self) -> Result<String, String> {
        match self {
            ToolOutcome::Success(body) => Ok(body.to_string()),
            ToolOutcome::Failure(body) => Err(body.to_string()),
        }
    }
}
