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

//! # Listings Results Parser
//!
//! Side-effect free extraction of stay search results and listing detail
//! sections from the client data embedded in Airbnb pages.
//!
//! The upstream shape is not a contract: every navigation step fails with
//! [`ScrapeError::Extraction`] naming the path that was missing.

use crate::scrape_errors::ScrapeError;
use crate::value_projection::{AllowSchema, project_flat, prune};
use base64::{Engine as _, engine::general_purpose::STANDARD, engine::general_purpose::STANDARD_NO_PAD};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value, json};

pub const SEARCH_RESULTS_PATH: &[&str] = &["data", "presentation", "staysSearch", "results"];
pub const DETAIL_SECTIONS_PATH: &[&str] = &[
    "data",
    "presentation",
    "stayProductDetailPage",
    "sections",
    "sections",
];

pub static SEARCH_RESULT_SCHEMA: Lazy<AllowSchema> = Lazy::new(|| {
    AllowSchema::try_from(&json!({
        "demandStayListing": {
            "id": true,
            "description": true,
            "location": true
        },
        "badges": {
            "text": true
        },
        "structuredContent": {
            "mapCategoryInfo": { "body": true },
            "mapSecondaryLine": { "body": true },
            "primaryLine": { "body": true },
            "secondaryLine": { "body": true }
        },
        "avgRatingA11yLabel": true,
        "listingParamOverrides": true,
        "structuredDisplayPrice": {
            "primaryLine": { "accessibilityLabel": true },
            "secondaryLine": { "accessibilityLabel": true },
            "explanationData": {
                "title": true,
                "priceDetails": {
                    "items": {
                        "description": true,
                        "priceString": true
                    }
                }
            }
        }
    }))
    .unwrap()
});

/// Keyed by section id; only sections listed here are returned.
pub static DETAIL_SECTION_SCHEMA: Lazy<AllowSchema> = Lazy::new(|| {
    AllowSchema::try_from(&json!({
        "HERO_DEFAULT": {
            "title": true,
            "previewImages": { "baseUrl": true }
        },
        "LOCATION_DEFAULT": {
            "lat": true,
            "lng": true,
            "subtitle": true,
            "title": true
        },
        "POLICIES_DEFAULT": {
            "title": true,
            "houseRulesSections": {
                "title": true,
                "items": { "title": true }
            }
        },
        "HIGHLIGHTS_DEFAULT": {
            "highlights": { "title": true }
        },
        "DESCRIPTION_DEFAULT": {
            "htmlDescription": { "htmlText": true }
        },
        "AMENITIES_DEFAULT": {
            "title": true,
            "seeAllAmenitiesGroups": {
                "title": true,
                "amenities": { "title": true }
            }
        }
    }))
    .unwrap()
});

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaysSearchResults {
    pub search_results: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_info: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingDetails {
    pub details: Vec<Value>,
}

/// Walks `path` from `root`, naming the first missing segment on failure.
fn navigate<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value, ScrapeError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        current = current.get(*segment).ok_or_else(|| {
            ScrapeError::extraction(format!("missing `{}`", path[..=depth].join(".")))
        })?;
    }
    Ok(current)
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, ScrapeError> {
    value
        .as_array()
        .ok_or_else(|| ScrapeError::extraction(format!("`{}` is not an array", what)))
}

/// Listing ids are published as base64 of `"<Type>:<numeric id>"`.
pub fn decode_listing_id(encoded: &str) -> Result<String, ScrapeError> {
    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .map_err(|e| ScrapeError::extraction(format!("listing id `{}` is not base64: {}", encoded, e)))?;
    let decoded = String::from_utf8(bytes)
        .map_err(|_| ScrapeError::extraction(format!("listing id `{}` is not UTF-8", encoded)))?;
    decoded
        .split(':')
        .nth(1)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ScrapeError::extraction(format!("listing id `{}` has no `:` separated id", decoded))
        })
}

pub fn listing_url(base_url: &str, id: &str) -> String {
    format!("{}/rooms/{}", base_url, id)
}

fn search_result_entry(result: &Value, base_url: &str) -> Result<Value, ScrapeError> {
    let projected = project_flat(result, &SEARCH_RESULT_SCHEMA);
    let Value::Object(fields) = projected else {
        return Err(ScrapeError::extraction("search result is not an object"));
    };
    let encoded_id = fields
        .get("demandStayListing")
        .and_then(|listing| listing.get("id"))
        .and_then(Value::as_str)
        .ok_or_else(|| ScrapeError::extraction("missing `demandStayListing.id`"))?;
    let id = decode_listing_id(encoded_id)?;

    let mut entry = Map::new();
    entry.insert("id".to_string(), Value::String(id.clone()));
    entry.insert("url".to_string(), Value::String(listing_url(base_url, &id)));
    entry.extend(fields);
    Ok(Value::Object(entry))
}

impl StaysSearchResults {
    pub fn from_client_data(client_data: &Value, base_url: &str) -> Result<Self, ScrapeError> {
        let mut results = navigate(client_data, SEARCH_RESULTS_PATH)?.clone();
        prune(&mut results);

        let raw_results = results
            .get("searchResults")
            .ok_or_else(|| ScrapeError::extraction("missing `searchResults`"))?;
        let search_results = as_array(raw_results, "searchResults")?
            .iter()
            .map(|result| search_result_entry(result, base_url))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            search_results,
            pagination_info: results.get("paginationInfo").cloned(),
        })
    }

    pub fn to_mcp_api_response(&self, search_url: &str) -> Value {
        let mut response = json!({ "searchUrl": search_url });
        if let (Value::Object(out), Ok(Value::Object(fields))) =
            (&mut response, serde_json::to_value(self))
        {
            out.extend(fields);
        }
        response
    }
}

impl ListingDetails {
    pub fn from_client_data(client_data: &Value) -> Result<Self, ScrapeError> {
        let sections = navigate(client_data, DETAIL_SECTIONS_PATH)?;
        let sections = as_array(sections, &DETAIL_SECTIONS_PATH.join("."))?;

        let mut details = Vec::new();
        for section in sections {
            let mut section = section.clone();
            prune(&mut section);

            let Some(section_id) = section.get("sectionId").and_then(Value::as_str) else {
                continue;
            };
            let Some(schema) = DETAIL_SECTION_SCHEMA.get(section_id) else {
                tracing::trace!("Skipping section {}", section_id);
                continue;
            };

            let mut entry = Map::new();
            entry.insert("id".to_string(), Value::String(section_id.to_string()));
            if let Some(body) = section.get("section") {
                if let Value::Object(fields) = project_flat(body, schema) {
                    entry.extend(fields);
                }
            }
            details.push(Value::Object(entry));
        }

        Ok(Self { details })
    }

    pub fn to_mcp_api_response(&self, listing_url: &str) -> Value {
        json!({
            "listingUrl": listing_url,
            "details": self.details,
        })
    }
}
