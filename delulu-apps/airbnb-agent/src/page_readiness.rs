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

//! # Page Readiness
//!
//! Side-effect free check that a fetched page carries its deferred-render
//! payload. Airbnb can answer with a loading shell whose data container is
//! absent or empty; such pages are "not ready", which is not a parse bug.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;

/// Client data wrapper key inside the deferred state script.
const CLIENT_DATA_KEY: &str = "niobeClientData";

static DEFERRED_STATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#data-deferred-state-0").unwrap());

/// Text content of the first deferred state container, if any.
fn deferred_state_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let element = document.select(&DEFERRED_STATE).next()?;
    Some(element.text().collect())
}

/// Parses the deferred state and returns its client data, `niobeClientData[0][1]`.
pub fn read_client_data(html: &str) -> Option<Value> {
    let text = deferred_state_text(html)?;
    if text.trim().is_empty() {
        return None;
    }
    let mut state: Value = serde_json::from_str(&text).ok()?;
    let client_data = state
        .get_mut(CLIENT_DATA_KEY)?
        .get_mut(0)?
        .get_mut(1)?
        .take();
    (!client_data.is_null()).then_some(client_data)
}

/// True when the page holds a parseable deferred state with client data.
pub fn is_page_ready(html: &str) -> bool {
    read_client_data(html).is_some()
}
